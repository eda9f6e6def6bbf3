//! Parser for per-entry `stat` output.
//!
//! The bridge runs
//! `find / -path /proc -prune -o -print0 | xargs -0 stat -c "%i|%A|%Z|%Y|%X|%U|%G|%s|%N"`
//! which yields one line per entry:
//!
//! ```text
//! 1234|drwxrwx--x|1700000000|1700000001|1700000002|system|system|3452|'/data/app'
//! 99|lrwxrwxrwx|1700000000|1700000000|1700000000|root|root|11|'/sdcard' -> '/storage/self/primary'
//! ```

use time::OffsetDateTime;
use tracing::debug;

use super::path;
use crate::models::file_entry::{EntryInfo, FileKind, Permissions};

const FIELDS: usize = 9;

/// Parses stat lines into entries. Lines with missing fields or a
/// non-absolute path are skipped; unparseable numbers become absent values.
pub fn parse_stat(text: &str) -> Vec<EntryInfo> {
    text.lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let entry = parse_stat_line(raw.trim_end_matches('\r'));
            if entry.is_none() && !raw.trim().is_empty() {
                debug!(line = index + 1, text = raw, "skipping stat line");
            }
            entry
        })
        .collect()
}

fn parse_stat_line(line: &str) -> Option<EntryInfo> {
    let parts: Vec<&str> = line.splitn(FIELDS, '|').collect();
    if parts.len() < FIELDS {
        return None;
    }

    let mode = parts[1];
    let kind = FileKind::from_mode_char(mode.chars().next()?);
    let path = path::normalize(&quoted_name(parts[8], kind))?;

    let mut entry = EntryInfo::new(path, kind);
    entry.inode = parts[0].parse().ok();
    entry.permissions = Permissions::from_ls_string(mode, parts[5], parts[6]);
    entry.created = timestamp(parts[2]);
    entry.modified = timestamp(parts[3]);
    entry.accessed = timestamp(parts[4]);
    if !kind.is_dir() {
        entry.size = parts[7].parse().ok();
    }
    Some(entry)
}

/// Unquotes a `%N` field: `'name'`, `'link' -> 'target'`, with `'\''`
/// standing for an embedded quote.
fn quoted_name(field: &str, kind: FileKind) -> String {
    if let Some(rest) = field.strip_prefix('\'') {
        let end = rest.find("' -> '").or_else(|| rest.rfind('\''));
        let inner = match end {
            Some(end) => &rest[..end],
            None => rest,
        };
        return inner.replace("'\\''", "'");
    }
    match (kind, field.split_once(" -> ")) {
        (FileKind::Symlink, Some((link, _))) => link.to_string(),
        _ => field.to_string(),
    }
}

fn timestamp(field: &str) -> Option<OffsetDateTime> {
    let secs: i64 = field.split('.').next()?.parse().ok()?;
    OffsetDateTime::from_unix_timestamp(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_full_line() {
        let entries =
            parse_stat("1234|-rw-r-----|1700000000|1700000001|1700000002|u0_a1|sdcard_rw|42|'/sdcard/a|b.txt'\n");
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.path, "/sdcard/a|b.txt");
        assert_eq!(entry.kind, FileKind::File);
        assert_eq!(entry.inode, Some(1234));
        assert_eq!(entry.size, Some(42));
        assert_eq!(entry.permissions.as_ref().map(|p| p.octal()), Some("0640".into()));
        assert_eq!(entry.permissions.as_ref().map(|p| p.owner.as_str()), Some("u0_a1"));
        assert_eq!(entry.modified, Some(datetime!(2023-11-14 22:13:21 UTC)));
        assert_eq!(entry.created, Some(datetime!(2023-11-14 22:13:20 UTC)));
        assert_eq!(entry.accessed, Some(datetime!(2023-11-14 22:13:22 UTC)));
    }

    #[test]
    fn symlink_target_is_stripped() {
        let entries =
            parse_stat("9|lrwxrwxrwx|0|0|0|root|root|21|'/sdcard' -> '/storage/self/primary'");
        assert_eq!(entries[0].path, "/sdcard");
        assert_eq!(entries[0].kind, FileKind::Symlink);
    }

    #[test]
    fn directory_sizes_are_absent() {
        let entries = parse_stat("2|drwxr-xr-x|0|0|0|root|root|4096|'/data/'");
        assert_eq!(entries[0].path, "/data");
        assert_eq!(entries[0].size, None);
    }

    #[test]
    fn tolerates_bad_numbers_and_skips_bad_lines() {
        let text = "\
x|-rw-r--r--|?|?|?|root|root|?|'/f'
too|few|fields
1|-rw-r--r--|0|0|0|root|root|1|'relative'
1|-rw-r--r--|0|0|0|root|root|1|/plain name
";
        let entries = parse_stat(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].inode, None);
        assert_eq!(entries[0].size, None);
        assert_eq!(entries[0].modified, None);
        assert_eq!(entries[1].path, "/plain name");
    }

    #[test]
    fn unescapes_embedded_quotes() {
        assert_eq!(quoted_name("'it'\\''s'", FileKind::File), "it's");
    }
}
