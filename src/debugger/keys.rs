/// The first `keys_to` bytes of a macro line.
///
/// Columns reported by the editor are byte offsets, so a cursor sitting on a
/// multi-byte character must still include that whole character.
pub fn macro_prefix(macro_line: &str, keys_to: usize) -> &str {
    if keys_to >= macro_line.len() {
        return macro_line;
    }
    let mut end = keys_to;
    while !macro_line.is_char_boundary(end) {
        end += 1;
    }
    &macro_line[..end]
}
