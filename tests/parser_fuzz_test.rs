use proptest::prelude::*;
use remotefs::services::fs::{parse_ls_lr, to_json, FileSystemTree};

const LISTING_LINES: &[&str] = &[
    "/data:",
    "/data/sub:",
    "./relative:",
    "total 12",
    "drwxr-xr-x 2 root root 4096 2024-01-01 12:00 sub",
    "-rw-r--r-- 1 root root 10 Jan  1 12:00 a file",
    "lrwxrwxrwx 1 root root 4 2024-01-01 12:00 l -> /x",
    "crw-rw-rw- 1 root root 1, 3 2024-01-01 12:00 null",
    "-rw-r--r-- 1 root root",
    "-rw-r--r-- 1 u g 1 9999-12-31 23:59 -2359 edge",
    "notes:",
    "config.txt 1024",
    "sub",
    "ls: /data/x: Permission denied",
    "",
];

proptest! {
    #[test]
    fn ls_lr_never_fails_on_arbitrary_text(text in "(?s).{0,400}") {
        let tree = FileSystemTree::from_ls_lr("/", &text).unwrap();
        prop_assert_eq!(to_json(&tree), to_json(&tree));
    }

    #[test]
    fn find_never_fails_on_arbitrary_text(text in "(/?[a-z /.]{0,12}\n){0,30}") {
        let tree = FileSystemTree::from_find_type_d("/", &text).unwrap();
        prop_assert_eq!(tree.stats().files, 0);
    }

    #[test]
    fn ls_lr_survives_shuffled_and_truncated_lines(
        picks in proptest::collection::vec((0..LISTING_LINES.len(), 0usize..60), 0..40)
    ) {
        let text: String = picks
            .iter()
            .map(|&(i, cut)| {
                let line = LISTING_LINES[i];
                let end = line
                    .char_indices()
                    .map(|(idx, _)| idx)
                    .chain(std::iter::once(line.len()))
                    .find(|&idx| idx >= cut)
                    .unwrap_or(line.len());
                format!("{}\n", &line[..end])
            })
            .collect();
        let facts = parse_ls_lr("/data", &text);
        let tree = FileSystemTree::from_ls_lr("/data", &text).unwrap();
        prop_assert!(tree.stats().directories <= facts.len() * 2 + 1);
        prop_assert_eq!(to_json(&tree), to_json(&tree));
    }
}
