//! Shared validation helpers.

/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range<T>(errors: &mut Vec<String>, name: &str, value: T, min: T, max: T)
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error unless `url` is an http(s) URL.
pub(crate) fn validate_http_url(errors: &mut Vec<String>, name: &str, url: &str) {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        errors.push(format!("{name} = \"{url}\" must be an http(s) URL"));
    }
}
