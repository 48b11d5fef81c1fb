//! Slug 生成
//!
//! 小写化，非字母数字的连续片段折叠为单个 `-`，去掉首尾的 `-`。

pub fn derive_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// 判断字符串本身是否已经是规范 slug
pub fn is_slug(s: &str) -> bool {
    !s.is_empty() && derive_slug(s) == s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_title() {
        assert_eq!(derive_slug("My New Project!!"), "my-new-project");
    }

    #[test]
    fn test_idempotent() {
        let once = derive_slug("  Hello -- World 2024 ");
        assert_eq!(once, "hello-world-2024");
        assert_eq!(derive_slug(&once), once);
        assert!(is_slug(&once));
    }

    #[test]
    fn test_edges() {
        assert_eq!(derive_slug(""), "");
        assert_eq!(derive_slug("!!!"), "");
        assert_eq!(derive_slug("---a---"), "a");
        assert_eq!(derive_slug("Café Déjà Vu"), "caf-d-j-vu");
        assert!(!is_slug("Not A Slug"));
        assert!(!is_slug(""));
    }
}
