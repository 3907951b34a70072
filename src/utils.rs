//! Naming helpers for archive entries

/// Maximum number of rename attempts when resolving entry collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Split an entry name into stem and extension at the last `.`
///
/// Leading dots (".hidden") and dots inside directory components do not count.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && !stem.is_empty() && !stem.ends_with('/') => {
            (stem, Some(ext))
        }
        _ => (name, None),
    }
}

/// Find a free entry name by appending ` (n)` before the extension
///
/// Returns `name` unchanged when it is not taken, otherwise `stem (1).ext`,
/// `stem (2).ext`, ... Returns `None` if every candidate is taken.
///
/// # Examples
///
/// ```
/// use batch_media::utils::unique_entry_name;
///
/// let taken = ["photo.jpg", "photo (1).jpg"];
/// let name = unique_entry_name("photo.jpg", |n| taken.contains(&n));
/// assert_eq!(name.as_deref(), Some("photo (2).jpg"));
/// ```
pub fn unique_entry_name(name: &str, is_taken: impl Fn(&str) -> bool) -> Option<String> {
    if !is_taken(name) {
        return Some(name.to_string());
    }

    let (stem, extension) = split_extension(name);
    (1..=MAX_RENAME_ATTEMPTS)
        .map(|i| match extension {
            Some(ext) => format!("{} ({}).{}", stem, i, ext),
            None => format!("{} ({})", stem, i),
        })
        .find(|candidate| !is_taken(candidate))
}

/// Extension for a fetched image, taken from the URL path
///
/// Everything after the last `.` of the final path segment is used; segments
/// without a dot default to `jpg`. Query strings and fragments are ignored.
pub fn extension_from_url(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative or malformed: strip query/fragment by hand
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let segment = path.rsplit('/').next().unwrap_or_default();
    match segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_string(),
        _ => "jpg".to_string(),
    }
}

/// Archive entry name for the `ordinal`-th (1-based) image of a product
pub fn image_filename(sku: &str, ordinal: usize, url: &str) -> String {
    format!("{}_{}.{}", sku, ordinal, extension_from_url(url))
}
