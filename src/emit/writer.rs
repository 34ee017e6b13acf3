//! Line-oriented text assembly for one declaration.

use crate::language::RenderRules;

/// Accumulates the lines of one declaration at a given nesting depth.
///
/// Lines are stored without line endings. Template lines lose trailing
/// whitespace; doc text is kept as authored. The profile's line ending is
/// applied once in [`DeclarationWriter::finish`].
pub(crate) struct DeclarationWriter<'a> {
    rules: &'a RenderRules,
    lines: Vec<String>,
    depth: usize,
}

impl<'a> DeclarationWriter<'a> {
    pub(crate) fn new(rules: &'a RenderRules) -> Self {
        Self {
            rules,
            lines: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn line(&mut self, text: &str) {
        self.push(text.trim_end());
    }

    fn push(&mut self, text: &str) {
        let mut line = self.rules.indent.repeat(self.depth);
        line.push_str(text);
        self.lines.push(line);
    }

    pub(crate) fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub(crate) fn indent(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Render a doc block. Every line of `doc` goes through the line template,
    /// followed by `extra` lines (such as an orientation note).
    pub(crate) fn doc(&mut self, doc: Option<&str>, extra: &[String]) {
        let lines: Vec<&str> = doc
            .into_iter()
            .flat_map(str::lines)
            .chain(extra.iter().map(String::as_str))
            .collect();
        if lines.is_empty() {
            return;
        }

        let style = &self.rules.doc;
        if let Some(open) = &style.open {
            self.line(open);
        }
        for text in lines {
            let rendered = style.line.replace("{line}", text);
            if text.trim().is_empty() {
                self.line(&rendered);
            } else {
                self.push(&rendered);
            }
        }
        if let Some(close) = &style.close {
            self.line(close);
        }
    }

    /// Open a declaration using one of the profile's open templates.
    pub(crate) fn open(&mut self, template: &[String], name: &str) {
        for line in template {
            let rendered = line.replace("{name}", name);
            self.line(&rendered);
        }
        self.indent();
    }

    pub(crate) fn close(&mut self) {
        self.dedent();
        let close = self.rules.close.clone();
        self.line(&close);
    }

    pub(crate) fn finish(self) -> String {
        self.lines.join(&self.rules.line_ending)
    }
}

/// Join rendered declarations into the full text of a unit: the file header,
/// a blank line, then declarations separated by blank lines. The text always
/// ends with a line ending.
pub(crate) fn join_unit(rules: &RenderRules, declarations: &[&str]) -> String {
    let eol = rules.line_ending.as_str();
    let mut text = String::new();

    for line in &rules.file_header {
        text.push_str(line.trim_end());
        text.push_str(eol);
    }
    if !rules.file_header.is_empty() {
        text.push_str(eol);
    }

    for (i, declaration) in declarations.iter().enumerate() {
        if i > 0 {
            text.push_str(eol);
            text.push_str(eol);
        }
        text.push_str(declaration);
    }
    text.push_str(eol);
    text
}
