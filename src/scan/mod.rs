//! @module "Scanner"
//! @summary "Per-file declaration scanning"
//! @layer service
//!
//! Walks the doc comments of one source text, classifies what each
//! annotated comment documents, and assembles a [`FileMetadata`].

use std::path::Path;

use crate::error::{MetaError, Result};
use crate::parse::{classify, declaration_head, CommentBlock, Declaration};
use crate::store::FileMetadata;

/// Result of scanning one file.
#[derive(Debug)]
pub struct Scanned {
    /// Everything recorded before the scan ended
    pub metadata: FileMetadata,
    /// Why the scan ended early, if it did
    pub error: Option<MetaError>,
}

impl Scanned {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Scanner for class files
#[derive(Debug, Default, Clone, Copy)]
pub struct Scanner {}

impl Scanner {
    pub fn new() -> Self {
        Self {}
    }

    /// Read a file and scan its content. The path becomes the file name.
    pub fn scan_file<P: AsRef<Path>>(&self, path: P) -> Result<Scanned> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| MetaError::read_file(path, e))?;
        Ok(self.scan(&path.to_string_lossy(), &content))
    }

    /// Scan source text.
    ///
    /// Only comments carrying at least one annotation and directly followed
    /// by a class, method or accessor signature are recorded. An
    /// unterminated comment stops the scan; what was found before it is kept.
    pub fn scan(&self, file_name: &str, content: &str) -> Scanned {
        let mut metadata = FileMetadata::new(file_name);
        let mut cursor = 0;

        loop {
            let span = match CommentBlock::from_span(content, cursor) {
                Ok(Some(span)) => span,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(file = file_name, error = %err, "stopping scan");
                    return Scanned {
                        metadata,
                        error: Some(err),
                    };
                }
            };
            cursor = span.end;

            if !span.block.has_annotations() {
                continue;
            }

            // The brace after an undocumented head may open an unrelated
            // block, so the cursor only moves past it once it is recorded.
            let Some(head_end) = declaration_head(content, span.end) else {
                continue;
            };
            let declaration = classify(&content[span.end..head_end]);
            if declaration == Declaration::None {
                continue;
            }

            metadata.record(span.block.with_declaration(declaration));
            cursor = head_end;
        }

        tracing::debug!(
            file = file_name,
            class = metadata.class_name().unwrap_or("-"),
            methods = metadata.method_count(),
            properties = metadata.property_count(),
            "scanned"
        );
        Scanned {
            metadata,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MOCK: &str = r#"
let privateProps = {
  dbProperty: '',
  readOnlyProperty: 'foo'
};

/**
 * A class to validate the annotations library against.
 *
 * @type {Mock}
 */
class Mock extends Base {

  constructor(){

  }
  // This will be skipped
  get foobar(){

  }

  /**
   * This property will be memoized
   *
   * @type {string}
   * @column
   * @test
   */
  get dbProperty(){
    return privateProps.dbProperty;
  }

  /**
   * @type {string}
   * @column
   * @test
   */
  set dbProperty(val){
    privateProps.dbProperty = val;
  }

  /**
   * This property will be memoized as read-only, unless a setter was found.
   *
   * @type {string}
   * @test
   */
  get readOnlyProperty(){
    return privateProps.readOnlyProperty;
  }

  doThing(){

  }

  /**
   * This will be skipped
   *
   */
  doNothing(){

  }

  /**
   * @test foo
   * @bar
   */
  doSomething(){

  }

  /**
   * @test foo
   * @param {string} foo
   * @param {int} bar
   * @return {string | int}
   */
  doSomethingElse(foo, bar){
    return(foo ? 0 : '');
  }

  /**
   * @test foo
   * @param {string} foo
   */
  doAnotherThing(foo)
  {
    /**
     * This should be ignored.
     * @see adadadwad
     */
    doThing();
  }

  /**
   * @test foo
   * @param {object} foo
   */
  deconstructedMethod(bar, {foo}){
    doThing();
  }
}
"#;

    #[test]
    fn test_scan_mock_class() {
        let scanned = Scanner::new().scan("mocks/Mock.js", MOCK);
        assert!(scanned.is_complete());

        let meta = scanned.metadata;
        assert_eq!(meta.file_name(), "mocks/Mock.js");
        assert_eq!(meta.class_name(), Some("Mock"));
        assert_eq!(meta.class_extends(), Some("Base"));
        assert_eq!(
            meta.class_doc().unwrap().annotations("type")[0].type_name(),
            Some("Mock")
        );

        assert_eq!(
            meta.methods().collect::<Vec<_>>(),
            vec!["doSomething", "doSomethingElse", "doAnotherThing", "deconstructedMethod"]
        );
        for method in meta.methods() {
            assert_eq!(meta.method(method).unwrap().first_value("test"), Some("foo"));
        }
        assert!(!meta.method("doAnotherThing").unwrap().has_annotation("see"));

        assert_eq!(
            meta.properties().collect::<Vec<_>>(),
            vec!["dbProperty", "readOnlyProperty"]
        );
        assert!(!meta.property("dbProperty").unwrap().read_only());
        assert!(meta.property("readOnlyProperty").unwrap().read_only());
        assert!(meta.property("dbProperty").unwrap().doc().has_annotation("column"));
    }

    #[test]
    fn test_counts_for_getter_only_properties() {
        let mut source = String::from("/** @entity */\nclass Model {\n");
        for i in 0..3 {
            source.push_str(&format!("  /** @m {i} */\n  method{i}(a, b) {{ }}\n"));
        }
        for i in 0..2 {
            source.push_str(&format!("  /** @p {i} */\n  get prop{i}() {{ return 1; }}\n"));
        }
        source.push_str("}\n");

        let meta = Scanner::new().scan("Model.js", &source).metadata;
        assert_eq!(meta.method_count(), 3);
        assert_eq!(meta.property_count(), 2);
        assert!(meta.properties().all(|p| meta.property(p).unwrap().read_only()));
    }

    #[test]
    fn test_setter_before_getter() {
        let source = "/** @c */ class A {\n  /** @s */ set v(x) {}\n  /** @g */ get v() {}\n}";
        let meta = Scanner::new().scan("A.js", source).metadata;
        assert!(!meta.property("v").unwrap().read_only());
    }

    #[test]
    fn test_no_class_comment_is_empty_not_error() {
        let scanned = Scanner::new().scan("plain.js", "class Plain {\n  run() {}\n}\n");
        assert!(scanned.is_complete());
        assert!(scanned.metadata.is_empty());
        assert_eq!(scanned.metadata.class_name(), None);
    }

    #[test]
    fn test_unterminated_comment_keeps_partial_result() {
        let source = "/** @c */\nclass A {\n  /** @m */\n  first() {}\n  /**\n   * @broken\n  second() {}\n}";
        let scanned = Scanner::new().scan("A.js", source);

        assert!(matches!(
            scanned.error,
            Some(MetaError::UnterminatedComment { line: 5, .. })
        ));
        assert_eq!(scanned.metadata.class_name(), Some("A"));
        assert_eq!(scanned.metadata.methods().collect::<Vec<_>>(), vec!["first"]);
    }

    #[test]
    fn test_comment_before_statement_is_skipped() {
        let source = "/** @c */ class A {\n  run() {\n    /** @note */\n    helper();\n    if (x) { y(); }\n  }\n  /** @m */\n  other() {}\n}";
        let meta = Scanner::new().scan("A.js", source).metadata;
        assert_eq!(meta.methods().collect::<Vec<_>>(), vec!["other"]);
    }

    #[test]
    fn test_second_class_is_ignored() {
        let source = "/** @a */ class A {}\n/** @b */ class B extends A {}\n";
        let meta = Scanner::new().scan("two.js", source).metadata;
        assert_eq!(meta.class_name(), Some("A"));
        assert_eq!(meta.class_extends(), None);
    }

    #[test]
    fn test_commonjs_class_exports() {
        let source = r#"
const Base = require('./Base');

/**
 * @type {module.Annotation}
 */
module.exports = class Annotation {
  /**
   * @type {string}
   */
  get name(){
    return this._name;
  }

  /**
   * @test
   */
  run(){
  }
};
"#;
        let meta = Scanner::new().scan("Annotation.js", source).metadata;
        assert_eq!(meta.class_name(), Some("Annotation"));
        assert_eq!(
            meta.class_doc().unwrap().annotations("type")[0].type_name(),
            Some("module.Annotation")
        );
        assert_eq!(meta.properties().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(meta.methods().collect::<Vec<_>>(), vec!["run"]);

        let assigned = "/** @class */\nconst Foo = class Foo extends Bar {\n  /** @m */\n  go() {}\n};\n";
        let meta = Scanner::new().scan("Foo.js", assigned).metadata;
        assert_eq!(meta.class_name(), Some("Foo"));
        assert_eq!(meta.class_extends(), Some("Bar"));
        assert_eq!(meta.method_count(), 1);
    }

    #[test]
    fn test_scan_file_reports_missing_file() {
        let err = Scanner::new().scan_file("/definitely/not/here.js").unwrap_err();
        assert!(matches!(err, MetaError::ReadFile { .. }));
    }
}
