use crate::utils::offset_to_line_col;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sourcemap::SourceMapBuilder as RawBuilder;

/// Builder for Source Map v3 output, fed by the emitter as it writes.
///
/// The emitter routes every appended chunk through [`advance`] so the
/// generated position stays in sync, and drops a mapping at the open and
/// close of each selector and declaration.
///
/// [`advance`]: SourceMapBuilder::advance
pub struct SourceMapBuilder {
    builder: RawBuilder,
    source: String,
    source_id: u32,
    source_root: Option<String>,
    current_line: u32,
    current_col: u32,
}

impl SourceMapBuilder {
    /// `file` is the output CSS path as recorded in the map; `source_path`
    /// and `source` describe the input stylesheet.
    pub fn new(
        file: Option<&str>,
        source_path: &str,
        source: &str,
        include_contents: bool,
    ) -> Self {
        let mut builder = RawBuilder::new(file);
        let source_id = builder.add_source(source_path);
        if include_contents {
            builder.set_source_contents(source_id, Some(source));
        }
        Self {
            builder,
            source: source.to_string(),
            source_id,
            source_root: None,
            current_line: 0,
            current_col: 0,
        }
    }

    pub fn set_source_root(&mut self, root: Option<String>) {
        self.source_root = root;
    }

    /// Tracks position advancement for text appended to the output buffer.
    pub fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.current_line += 1;
                self.current_col = 0;
            } else {
                self.current_col += 1;
            }
        }
    }

    pub fn current_position(&self) -> (u32, u32) {
        (self.current_line, self.current_col)
    }

    /// Maps the current output position back to a byte offset in the input.
    pub fn add_mapping(&mut self, source_offset: usize) {
        let (src_line, src_col) = offset_to_line_col(&self.source, source_offset);
        self.builder.add_raw(
            self.current_line,
            self.current_col,
            src_line,
            src_col,
            Some(self.source_id),
            None,
            false,
        );
    }

    /// Finishes the map and renders the JSON.
    pub fn into_json(self) -> String {
        let mut map = self.builder.into_sourcemap();
        if let Some(root) = &self.source_root {
            map.set_source_root(Some(root.as_str()));
        }
        let mut out = Vec::new();
        map.to_writer(&mut out)
            .expect("writing a source map to a Vec cannot fail");
        String::from_utf8(out).expect("source map JSON is UTF-8")
    }

    /// Renders as a `data:` URI suitable for an inline sourceMappingURL.
    pub fn into_data_uri(self) -> String {
        let json = self.into_json();
        format!(
            "data:application/json;base64,{}",
            STANDARD.encode(json.as_bytes())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut builder = SourceMapBuilder::new(None, "in.scss", ".a { b: c; }", false);
        builder.advance(".a {");
        assert_eq!(builder.current_position(), (0, 4));
        builder.advance("\n  ");
        assert_eq!(builder.current_position(), (1, 2));
    }

    #[test]
    fn json_has_v3_shape() {
        let mut builder =
            SourceMapBuilder::new(Some("out.css"), "in.scss", ".a { b: c; }", true);
        builder.add_mapping(0);
        builder.advance(".a");
        builder.add_mapping(5);
        let json = builder.into_json();
        assert!(json.contains("\"version\":3"));
        assert!(json.contains("in.scss"));
        assert!(json.contains("\"mappings\""));
    }

    #[test]
    fn data_uri_is_base64() {
        let builder = SourceMapBuilder::new(None, "in.scss", "", false);
        let uri = builder.into_data_uri();
        assert!(uri.starts_with("data:application/json;base64,"));
    }
}
