/// Joins path elements with `\`, skipping leading empty elements.
///
/// Empty elements after the first non-empty one are kept, so the result
/// mirrors how launchers concatenate Windows paths by hand.
pub fn path_join<S: AsRef<str>>(elems: &[S]) -> String {
    let elems: Vec<&str> = elems.iter().map(|e| e.as_ref()).collect();
    match elems.iter().position(|e| !e.is_empty()) {
        Some(start) => elems[start..].join("\\"),
        None => String::new(),
    }
}
