/// True when `file_name` is a `.csv` member whose name contains `key_word`.
/// Both checks are case-sensitive.
pub fn matches_group(key_word: &str, file_name: &str) -> bool {
    file_name.ends_with(".csv") && file_name.contains(key_word)
}

/// Returns `existing` with `file_name` appended if it belongs to the group
/// named by `key_word`, otherwise `existing` unchanged.
pub fn classify(mut existing: Vec<String>, key_word: &str, file_name: &str) -> Vec<String> {
    if matches_group(key_word, file_name) {
        existing.push(file_name.to_string());
    }
    existing
}

/// Every member of `file_names` that belongs to `key_word`'s group, in input order.
pub fn collect_group<I, S>(file_names: I, key_word: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    file_names
        .into_iter()
        .fold(Vec::new(), |acc, name| classify(acc, key_word, name.as_ref()))
}
