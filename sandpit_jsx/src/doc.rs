// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small Wadler-style document printer.
//!
//! Groups print flat when they fit in the remaining width and broken
//! otherwise; fills pack separators greedily. Hard lines force every
//! enclosing group to break.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Doc {
    /// Literal text. May contain newlines only when it must be kept verbatim.
    Text(String),
    /// A space when flat, a newline when broken.
    Line,
    /// Nothing when flat, a newline when broken.
    SoftLine,
    /// Always a newline.
    HardLine,
    IfBreak {
        broken: Box<Self>,
        flat: Box<Self>,
    },
    Indent(Box<Self>),
    Concat(Vec<Self>),
    /// `expanded`, when present, is printed instead of `contents` if the
    /// flat form does not fit.
    Group {
        contents: Box<Self>,
        expanded: Option<Box<Self>>,
        broken: bool,
    },
    /// Alternating content and separators.
    Fill(Vec<Self>),
}

impl Doc {
    pub(crate) fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub(crate) fn concat(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::Concat(parts.into_iter().collect())
    }

    pub(crate) fn indent(doc: Self) -> Self {
        Self::Indent(Box::new(doc))
    }

    /// A group that breaks when it contains a hard line or `force` is set.
    pub(crate) fn group(contents: Self, force: bool) -> Self {
        let broken = force || contents.will_break();
        Self::Group {
            contents: Box::new(contents),
            expanded: None,
            broken,
        }
    }

    /// Tries `flat` on one line, falling back to `expanded`.
    pub(crate) fn conditional_group(flat: Self, expanded: Self) -> Self {
        Self::Group {
            contents: Box::new(flat),
            expanded: Some(Box::new(expanded)),
            broken: false,
        }
    }

    pub(crate) fn if_break(broken: Self, flat: Self) -> Self {
        Self::IfBreak {
            broken: Box::new(broken),
            flat: Box::new(flat),
        }
    }

    /// Returns `true` if printing will certainly produce a newline.
    pub(crate) fn will_break(&self) -> bool {
        match self {
            Self::HardLine => true,
            Self::Text(_) | Self::Line | Self::SoftLine => false,
            Self::Group {
                broken: true, ..
            } => true,
            Self::Group { contents, .. } => contents.will_break(),
            Self::IfBreak { broken, flat } => broken.will_break() || flat.will_break(),
            Self::Indent(doc) => doc.will_break(),
            Self::Concat(parts) | Self::Fill(parts) => parts.iter().any(Self::will_break),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Break,
    Flat,
}

#[derive(Clone, Copy, Debug)]
enum Item<'d> {
    Doc(&'d Doc),
    /// The unprinted tail of a fill.
    Fill(&'d [Doc]),
}

#[derive(Clone, Copy, Debug)]
struct Cmd<'d> {
    indent: usize,
    mode: Mode,
    item: Item<'d>,
}

impl<'d> Cmd<'d> {
    fn new(indent: usize, mode: Mode, doc: &'d Doc) -> Self {
        Self {
            indent,
            mode,
            item: Item::Doc(doc),
        }
    }
}

fn text_width(s: &str) -> usize {
    s.chars().count()
}

fn to_isize(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}

/// Renders `doc` within `width` columns, indenting by `indent_width` spaces.
pub(crate) fn print(doc: &Doc, width: usize, indent_width: usize) -> String {
    let mut out = String::new();
    let mut pos = 0_usize;
    let mut stack = vec![Cmd::new(0, Mode::Break, doc)];

    while let Some(Cmd { indent, mode, item }) = stack.pop() {
        let doc = match item {
            Item::Doc(doc) => doc,
            Item::Fill(parts) => {
                print_fill(parts, indent, mode, width, pos, &mut stack);
                continue;
            }
        };
        match doc {
            Doc::Text(s) => {
                out.push_str(s);
                match s.rfind('\n') {
                    Some(i) => pos = text_width(&s[i + 1..]),
                    None => pos += text_width(s),
                }
            }
            Doc::Concat(parts) => {
                for part in parts.iter().rev() {
                    stack.push(Cmd::new(indent, mode, part));
                }
            }
            Doc::Indent(inner) => stack.push(Cmd::new(indent + indent_width, mode, inner)),
            Doc::IfBreak { broken, flat } => {
                let chosen = if mode == Mode::Break { broken } else { flat };
                stack.push(Cmd::new(indent, mode, chosen));
            }
            Doc::Group {
                contents,
                expanded,
                broken,
            } => match mode {
                Mode::Flat => {
                    let mode = if *broken { Mode::Break } else { Mode::Flat };
                    stack.push(Cmd::new(indent, mode, contents));
                }
                Mode::Break => {
                    let flat = Cmd::new(indent, Mode::Flat, contents);
                    let rem = to_isize(width) - to_isize(pos);
                    if !*broken && fits(&[flat], &stack, rem, false) {
                        stack.push(flat);
                    } else {
                        let chosen = expanded.as_deref().unwrap_or(contents);
                        stack.push(Cmd::new(indent, Mode::Break, chosen));
                    }
                }
            },
            Doc::Fill(parts) => print_fill(parts, indent, mode, width, pos, &mut stack),
            Doc::Line | Doc::SoftLine | Doc::HardLine => {
                if mode == Mode::Flat && *doc != Doc::HardLine {
                    if *doc == Doc::Line {
                        out.push(' ');
                        pos += 1;
                    }
                } else {
                    let trimmed = out.trim_end_matches([' ', '\t']).len();
                    out.truncate(trimmed);
                    out.push('\n');
                    out.extend(core::iter::repeat_n(' ', indent));
                    pos = indent;
                }
            }
        }
    }
    out
}

fn print_fill<'d>(
    parts: &'d [Doc],
    indent: usize,
    mode: Mode,
    width: usize,
    pos: usize,
    stack: &mut Vec<Cmd<'d>>,
) {
    let rem = to_isize(width) - to_isize(pos);
    let Some((content, rest)) = parts.split_first() else {
        return;
    };
    let content_flat = Cmd::new(indent, Mode::Flat, content);
    let content_break = Cmd::new(indent, Mode::Break, content);
    let content_fits = fits(&[content_flat], &[], rem, true);

    let Some((separator, rest)) = rest.split_first() else {
        stack.push(if content_fits {
            content_flat
        } else {
            content_break
        });
        return;
    };
    let separator_flat = Cmd::new(indent, Mode::Flat, separator);
    let separator_break = Cmd::new(indent, Mode::Break, separator);

    let Some(next) = rest.first() else {
        if content_fits {
            stack.extend([separator_flat, content_flat]);
        } else {
            stack.extend([separator_break, content_break]);
        }
        return;
    };

    stack.push(Cmd {
        indent,
        mode,
        item: Item::Fill(rest),
    });
    let pair = [
        content_flat,
        separator_flat,
        Cmd::new(indent, Mode::Flat, next),
    ];
    if fits(&pair, &[], rem, true) {
        stack.extend([separator_flat, content_flat]);
    } else if content_fits {
        stack.extend([separator_break, content_flat]);
    } else {
        stack.extend([separator_break, content_break]);
    }
}

/// Measures `next` (in print order) against `width`, continuing into `rest`
/// (a print stack) until the first possible line break.
fn fits(next: &[Cmd<'_>], rest: &[Cmd<'_>], mut width: isize, must_be_flat: bool) -> bool {
    let mut rest_idx = rest.len();
    let mut cmds: Vec<(Mode, Item<'_>)> = next.iter().rev().map(|c| (c.mode, c.item)).collect();

    while width >= 0 {
        let Some((mode, item)) = cmds.pop() else {
            if rest_idx == 0 {
                return true;
            }
            rest_idx -= 1;
            let cmd = rest[rest_idx];
            cmds.push((cmd.mode, cmd.item));
            continue;
        };
        let doc = match item {
            Item::Doc(doc) => doc,
            Item::Fill(parts) => {
                cmds.extend(parts.iter().rev().map(|p| (mode, Item::Doc(p))));
                continue;
            }
        };
        match doc {
            Doc::Text(s) => width -= to_isize(text_width(s)),
            Doc::Concat(parts) | Doc::Fill(parts) => {
                cmds.extend(parts.iter().rev().map(|p| (mode, Item::Doc(p))));
            }
            Doc::Indent(inner) => cmds.push((mode, Item::Doc(inner))),
            Doc::IfBreak { broken, flat } => {
                let chosen = if mode == Mode::Break { broken } else { flat };
                cmds.push((mode, Item::Doc(chosen)));
            }
            Doc::Group {
                contents,
                expanded,
                broken,
            } => {
                if must_be_flat && *broken {
                    return false;
                }
                let mode = if *broken { Mode::Break } else { mode };
                let chosen = match (mode, expanded) {
                    (Mode::Break, Some(expanded)) => expanded,
                    _ => contents,
                };
                cmds.push((mode, Item::Doc(chosen)));
            }
            Doc::HardLine => return true,
            Doc::Line | Doc::SoftLine => {
                if mode == Mode::Break {
                    return true;
                }
                if *doc == Doc::Line {
                    width -= 1;
                }
            }
        }
    }
    false
}
