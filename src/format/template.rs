use thiserror::Error;

/// A message template parsed once at startup.
///
/// Placeholders: `{}` takes the next argument, `{0}`/`{1}` pick one
/// explicitly, `{price}` and `{time}` are aliases for `{0}` and `{1}`.
/// `{{` and `}}` render literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Arg(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed `{{` at byte {0}")]
    Unclosed(usize),
    #[error("unmatched `}}` at byte {0}")]
    UnmatchedClose(usize),
    #[error("unknown placeholder `{{{0}}}`")]
    UnknownPlaceholder(String),
    #[error("cannot mix `{{}}` with numbered placeholders")]
    MixedNumbering,
    #[error("placeholder #{index} has no value; this template accepts {arity}")]
    OutOfRange { index: usize, arity: usize },
}

/// Named placeholders and the argument slot they stand for.
const NAMED: &[(&str, usize)] = &[("price", 0), ("time", 1)];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Numbering {
    Unset,
    Automatic,
    Manual,
}

impl Template {
    /// Parses `raw`, accepting placeholders for at most `arity` arguments.
    pub fn parse(raw: &str, arity: usize) -> Result<Self, TemplateError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut next_auto = 0;
        let mut numbering = Numbering::Unset;
        let mut chars = raw.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnmatchedClose(pos)),
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, '{')) | None => return Err(TemplateError::Unclosed(pos)),
                            Some((_, ch)) => name.push(ch),
                        }
                    }

                    let index = match name.trim() {
                        "" => {
                            numbering = switch(numbering, Numbering::Automatic)?;
                            next_auto += 1;
                            next_auto - 1
                        }
                        digits if digits.chars().all(|d| d.is_ascii_digit()) => {
                            numbering = switch(numbering, Numbering::Manual)?;
                            digits
                                .parse()
                                .map_err(|_| TemplateError::UnknownPlaceholder(name.clone()))?
                        }
                        named => NAMED
                            .iter()
                            .find(|(alias, _)| *alias == named)
                            .map(|(_, slot)| *slot)
                            .ok_or_else(|| TemplateError::UnknownPlaceholder(name.clone()))?,
                    };

                    if index >= arity {
                        return Err(TemplateError::OutOfRange { index, arity });
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Arg(index));
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(Self { pieces })
    }

    /// Substitutes `args`; a slot without an argument renders empty.
    pub fn render(&self, args: &[&str]) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Arg(i) => out.push_str(args.get(*i).copied().unwrap_or_default()),
            }
        }
        out
    }
}

fn switch(current: Numbering, wanted: Numbering) -> Result<Numbering, TemplateError> {
    if current == Numbering::Unset || current == wanted {
        Ok(wanted)
    } else {
        Err(TemplateError::MixedNumbering)
    }
}
