//! Parser for recursive long listings (`ls -lR`).
//!
//! Output is a sequence of blocks, each headed by `/absolute/dir:` and
//! followed by one line per child. Two child line shapes are understood:
//!
//! ```text
//! drwxrwx--x 4 system system 3452 2024-01-01 12:00 app      (long form)
//! -rw-r--r-- 1 root   root   1024 Jan  1  2024 config.txt
//! config.txt 1024                                           (short form)
//! sub
//! ```
//!
//! In the short form a trailing numeric token is a file size and anything
//! without one is a directory. Lines matching neither shape are skipped.

use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing::debug;

use super::path;
use crate::models::file_entry::{parse_mode_bits, FileKind, Permissions};

/// One structural fact recovered from a listing, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingFact {
    /// A block header: the directory exists even if it lists no children.
    Directory { path: String },
    /// A child line inside the block for `directory`.
    Child {
        directory: String,
        name: String,
        kind: FileKind,
        size: Option<u64>,
        permissions: Option<Permissions>,
        modified: Option<OffsetDateTime>,
    },
}

#[derive(Debug, PartialEq, Eq)]
struct ParsedLine {
    name: String,
    kind: FileKind,
    size: Option<u64>,
    permissions: Option<Permissions>,
    modified: Option<OffsetDateTime>,
}

/// Parses `ls -lR` output taken under `root`.
///
/// Lines before the first header belong to `root`. A header that is not an
/// absolute path under `root` drops its whole block.
pub fn parse_ls_lr(root: &str, text: &str) -> Vec<ListingFact> {
    let Some(root) = path::normalize(root) else {
        debug!(root, "listing root is not absolute");
        return Vec::new();
    };

    let mut facts = Vec::new();
    let mut current = Some(root.clone());
    let mut after_break = true;
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();
        if trimmed.is_empty() {
            after_break = true;
            continue;
        }
        let at_break = std::mem::replace(&mut after_break, false);
        if trimmed.starts_with("ls:") || is_total_line(trimmed) {
            continue;
        }

        if let Some(header) = header_of(trimmed, at_break) {
            current = match path::normalize(header) {
                Some(dir) if path::is_within(&dir, &root) => {
                    facts.push(ListingFact::Directory { path: dir.clone() });
                    Some(dir)
                }
                _ => {
                    debug!(line = index + 1, header, "dropping listing block");
                    None
                }
            };
            continue;
        }

        let Some(directory) = current.as_deref() else {
            continue;
        };
        match parse_line(line) {
            Some(parsed) if parsed.name == "." || parsed.name == ".." => {}
            Some(parsed) => facts.push(ListingFact::Child {
                directory: directory.to_string(),
                name: parsed.name,
                kind: parsed.kind,
                size: parsed.size,
                permissions: parsed.permissions,
                modified: parsed.modified,
            }),
            None => debug!(line = index + 1, text = line, "skipping listing line"),
        }
    }
    facts
}

fn is_total_line(line: &str) -> bool {
    match line.split_once(char::is_whitespace) {
        Some(("total", rest)) => !rest.trim().is_empty(),
        _ => false,
    }
}

/// `Some(dir)` for a `dir:` header line.
///
/// Absolute paths always head a block. A relative `name:` only does at the
/// start of the input or right after a blank line; elsewhere it is a child
/// whose name ends in `:`. Long-form lines never qualify.
fn header_of(line: &str, after_break: bool) -> Option<&str> {
    let header = line.strip_suffix(':')?;
    let first = header.split_whitespace().next();
    if first.is_some_and(|token| parse_mode_bits(token).is_some()) {
        return None;
    }
    (header.starts_with('/') || after_break).then_some(header)
}

/// Splits on whitespace, keeping each token's byte offset so names with
/// embedded spaces can be sliced out of the original line.
fn tokens(line: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, &line[s..]));
    }
    out
}

fn parse_line(line: &str) -> Option<ParsedLine> {
    let toks = tokens(line);
    let (_, first) = *toks.first()?;
    let parsed = match parse_mode_bits(first) {
        Some(_) => parse_long(line, &toks)?,
        None => parse_short(line, &toks)?,
    };
    if parsed.name.is_empty() || parsed.name.contains('/') {
        return None;
    }
    Some(parsed)
}

fn parse_long(line: &str, toks: &[(usize, &str)]) -> Option<ParsedLine> {
    let mode = toks[0].1;
    let kind = FileKind::from_mode_char(mode.chars().next()?);
    toks.get(1)?.1.parse::<u64>().ok()?;
    let owner = toks.get(2)?.1;
    let group = toks.get(3)?.1;
    let permissions = Permissions::from_ls_string(mode, owner, group);

    let size_tok = toks.get(4)?.1;
    let (size, mut next) = if let Some(major) = size_tok.strip_suffix(',') {
        // device node: "MAJOR, MINOR"
        major.parse::<u64>().ok()?;
        toks.get(5)?.1.parse::<u64>().ok()?;
        (None, 6)
    } else if let Some((major, minor)) = size_tok.split_once(',') {
        major.parse::<u64>().ok()?;
        minor.parse::<u64>().ok()?;
        (None, 5)
    } else {
        (Some(size_tok.parse::<u64>().ok()?), 5)
    };

    let (modified, used) = parse_date(&toks[next..])?;
    next += used;

    let (offset, _) = *toks.get(next)?;
    let mut name = &line[offset..];
    if kind == FileKind::Symlink {
        if let Some((link, _target)) = name.split_once(" -> ") {
            name = link;
        }
    }

    Some(ParsedLine {
        name: name.to_string(),
        kind,
        size: if kind.is_dir() { None } else { size },
        permissions,
        modified,
    })
}

fn parse_short(line: &str, toks: &[(usize, &str)]) -> Option<ParsedLine> {
    let &(last_offset, last) = toks.last()?;
    if toks.len() >= 2 {
        if let Ok(size) = last.parse::<u64>() {
            let name = line[toks[0].0..last_offset].trim_end();
            return Some(ParsedLine {
                name: name.to_string(),
                kind: FileKind::File,
                size: Some(size),
                permissions: None,
                modified: None,
            });
        }
    }
    let name = line.trim();
    let name = name.strip_suffix('/').unwrap_or(name);
    Some(ParsedLine {
        name: name.to_string(),
        kind: FileKind::Directory,
        size: None,
        permissions: None,
        modified: None,
    })
}

/// Parses the date columns at the start of `toks`. Returns the timestamp
/// (absent when the year is not shown) and the number of tokens consumed.
fn parse_date(toks: &[(usize, &str)]) -> Option<(Option<OffsetDateTime>, usize)> {
    let first = toks.first()?.1;

    if let Ok(date) = Date::parse(first, format_description!("[year]-[month]-[day]")) {
        let time = parse_clock(toks.get(1)?.1)?;
        let datetime = PrimitiveDateTime::new(date, time);
        return Some(match toks.get(2).and_then(|t| parse_zone(t.1)) {
            // an instant whose UTC form is unrepresentable keeps no timestamp
            Some(offset) => (
                datetime
                    .assume_offset(offset)
                    .checked_to_offset(UtcOffset::UTC),
                3,
            ),
            None => (Some(datetime.assume_utc()), 2),
        });
    }

    let month = parse_month(first)?;
    let day: u8 = toks.get(1)?.1.parse().ok()?;
    let third = toks.get(2)?.1;
    if third.contains(':') {
        parse_clock(third)?;
        return Some((None, 3));
    }
    let year: i32 = third.parse().ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some((Some(date.midnight().assume_utc()), 3))
}

fn parse_clock(token: &str) -> Option<Time> {
    let whole = token.split('.').next()?;
    match whole.matches(':').count() {
        1 => Time::parse(whole, format_description!("[hour]:[minute]")).ok(),
        2 => Time::parse(whole, format_description!("[hour]:[minute]:[second]")).ok(),
        _ => None,
    }
}

fn parse_zone(token: &str) -> Option<UtcOffset> {
    UtcOffset::parse(
        token,
        format_description!("[offset_hour sign:mandatory][offset_minute]"),
    )
    .ok()
}

fn parse_month(token: &str) -> Option<Month> {
    let month = match token {
        "Jan" => Month::January,
        "Feb" => Month::February,
        "Mar" => Month::March,
        "Apr" => Month::April,
        "May" => Month::May,
        "Jun" => Month::June,
        "Jul" => Month::July,
        "Aug" => Month::August,
        "Sep" => Month::September,
        "Oct" => Month::October,
        "Nov" => Month::November,
        "Dec" => Month::December,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn children(facts: &[ListingFact]) -> Vec<(&str, &str, FileKind, Option<u64>)> {
        facts
            .iter()
            .filter_map(|f| match f {
                ListingFact::Child {
                    directory,
                    name,
                    kind,
                    size,
                    ..
                } => Some((directory.as_str(), name.as_str(), *kind, *size)),
                ListingFact::Directory { .. } => None,
            })
            .collect()
    }

    #[test]
    fn short_form_block() {
        let facts = parse_ls_lr("/", "/data:\nconfig.txt 1024\nsub\n\n/data/sub:\n");
        assert_eq!(
            facts[0],
            ListingFact::Directory {
                path: "/data".into()
            }
        );
        assert_eq!(
            children(&facts),
            vec![
                ("/data", "config.txt", FileKind::File, Some(1024)),
                ("/data", "sub", FileKind::Directory, None),
            ]
        );
        assert_eq!(
            facts.last(),
            Some(&ListingFact::Directory {
                path: "/data/sub".into()
            })
        );
    }

    #[test]
    fn long_form_with_iso_dates() {
        let text = "\
/sdcard:
total 24
drwxrwx--x 2 root sdcard_rw 3452 2024-03-05 09:41 DCIM
-rw-rw---- 1 root sdcard_rw 1536 2024-03-05 09:42:17.123456789 +0100 My Notes.txt
lrwxrwxrwx 1 root root 21 2024-03-05 09:41 cache -> /data/cache
crw-rw-rw- 1 root root 1,   3 2024-03-05 09:41 null
";
        let facts = parse_ls_lr("/", text);
        assert_eq!(
            children(&facts),
            vec![
                ("/sdcard", "DCIM", FileKind::Directory, None),
                ("/sdcard", "My Notes.txt", FileKind::File, Some(1536)),
                ("/sdcard", "cache", FileKind::Symlink, Some(21)),
                ("/sdcard", "null", FileKind::Other, None),
            ]
        );
        let ListingFact::Child {
            permissions,
            modified,
            ..
        } = &facts[2]
        else {
            panic!("expected child fact");
        };
        assert_eq!(permissions.as_ref().map(|p| p.octal()), Some("0660".into()));
        assert_eq!(*modified, Some(datetime!(2024-03-05 09:42:17 +01:00)));
    }

    #[test]
    fn long_form_with_month_dates() {
        let text = "\
/etc:
-rw-r--r-- 1 root root 1024 Jan  9  2023 hosts
-rw-r--r-- 1 root root 77 Mar 14 10:05 fstab
";
        let facts = parse_ls_lr("/", text);
        let modified: Vec<_> = facts
            .iter()
            .filter_map(|f| match f {
                ListingFact::Child { name, modified, .. } => Some((name.as_str(), *modified)),
                _ => None,
            })
            .collect();
        assert_eq!(
            modified,
            vec![
                ("hosts", Some(datetime!(2023-01-09 0:00 UTC))),
                ("fstab", None),
            ]
        );
    }

    #[test]
    fn skips_noise_and_dot_entries() {
        let text = "\
/data:
total 8
drwxr-xr-x 2 root root 4096 2024-01-01 00:00 .
drwxr-xr-x 9 root root 4096 2024-01-01 00:00 ..
ls: /data/secret: Permission denied
-rw-r--r-- 1 root root
-rw-r--r-- 1 root root 3 2024-01-01 00:00 ok
";
        let facts = parse_ls_lr("/", text);
        assert_eq!(
            children(&facts),
            vec![("/data", "ok", FileKind::File, Some(3))]
        );
    }

    #[test]
    fn drops_blocks_with_bad_headers() {
        let text = "\
./relative:
lost 1

/elsewhere:
gone 2

/data/kept:
kept 3
";
        let facts = parse_ls_lr("/data", text);
        assert_eq!(
            children(&facts),
            vec![("/data/kept", "kept", FileKind::File, Some(3))]
        );
    }

    #[test]
    fn headers_are_normalized() {
        let facts = parse_ls_lr("/", "/data//sub/:\nf 1\n");
        assert_eq!(children(&facts), vec![("/data/sub", "f", FileKind::File, Some(1))]);
    }

    #[test]
    fn lines_before_any_header_belong_to_root() {
        let facts = parse_ls_lr("/data", "a.txt 5\nnested/\n");
        assert_eq!(
            children(&facts),
            vec![
                ("/data", "a.txt", FileKind::File, Some(5)),
                ("/data", "nested", FileKind::Directory, None),
            ]
        );
    }

    #[test]
    fn file_named_with_colon_is_not_a_header() {
        let facts = parse_ls_lr("/", "/d:\n-rw-r--r-- 1 u g 4 2024-01-01 00:00 odd:\n");
        assert_eq!(children(&facts), vec![("/d", "odd:", FileKind::File, Some(4))]);
    }

    #[test]
    fn short_form_child_ending_in_colon_stays_in_block() {
        let facts = parse_ls_lr("/", "/d:\nnotes:\nkept 1\n\nrel:\nlost 2\n");
        assert_eq!(
            children(&facts),
            vec![
                ("/d", "notes:", FileKind::Directory, None),
                ("/d", "kept", FileKind::File, Some(1)),
            ]
        );
    }

    #[test]
    fn unrepresentable_zoned_date_keeps_child_without_timestamp() {
        let facts = parse_ls_lr("/", "/d:\n-rw-r--r-- 1 u g 1 9999-12-31 23:59 -2359 f\n");
        let [_, ListingFact::Child { name, modified, .. }] = facts.as_slice() else {
            panic!("expected one child fact, got {facts:?}");
        };
        assert_eq!(name, "f");
        assert_eq!(*modified, None);
    }

    #[test]
    fn empty_input_and_bad_root_yield_nothing() {
        assert!(parse_ls_lr("/", "").is_empty());
        assert!(parse_ls_lr("relative", "/x:\na 1\n").is_empty());
    }

    #[test]
    fn tokens_keep_offsets() {
        assert_eq!(tokens("  a  bc d"), vec![(2, "a"), (5, "bc"), (8, "d")]);
    }
}
