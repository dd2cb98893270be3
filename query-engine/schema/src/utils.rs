pub fn capitalize<T>(s: T) -> String
where
    T: Into<String>,
{
    let s = s.into();
    let mut chars = s.chars();

    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => s,
    }
}
