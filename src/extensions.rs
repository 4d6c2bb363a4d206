//! Extension-string composition
//!
//! Wrapper-implemented extensions are appended to what the driver reports,
//! and the GL string is filtered before it is cached on a context.

use std::ffi::CString;

/// Client extensions the wrapper implements on top of the driver
pub const CLIENT_EXTENSIONS: &str = "EGL_EXT_platform_base \
                                     EGL_MESA_platform_surfaceless \
                                     EGL_KHR_platform_gbm \
                                     EGL_EXT_platform_wayland \
                                     EGL_KHR_platform_wayland ";

/// Display extension the driver never knows about
pub const WL_BIND_DISPLAY: &str = "EGL_WL_bind_wayland_display";

/// GL extension some drivers advertise without implementing
pub const READ_FORMAT_BGRA: &str = "GL_EXT_read_format_bgra";

/// Client extension string: the driver's, then the builtin list
pub fn client_extensions(driver: &str) -> String {
    let mut out = String::with_capacity(driver.len() + 1 + CLIENT_EXTENSIONS.len());
    out.push_str(driver);
    out.push(' ');
    out.push_str(CLIENT_EXTENSIONS);
    out
}

/// Per-display extension string with the Wayland binding appended
pub fn display_extensions(driver: &str) -> String {
    format!("{} {}", driver, WL_BIND_DISPLAY)
}

/// Remove every occurrence of `name`, leaving the separators in place
pub fn strip_extension(extensions: &str, name: &str) -> String {
    extensions.replace(name, "")
}

pub fn tokenize(extensions: &str) -> Vec<String> {
    extensions.split_whitespace().map(str::to_owned).collect()
}

/// GL extension answers cached on a context at first `eglMakeCurrent`
#[derive(Debug, Clone)]
pub struct GlExtensionCache {
    full: CString,
    tokens: Vec<CString>,
}

impl GlExtensionCache {
    /// Build from the driver's `GL_EXTENSIONS`, dropping
    /// `GL_EXT_read_format_bgra` unless it is known to work
    pub fn new(driver: &str, bgra_valid: bool) -> Self {
        let filtered = if bgra_valid {
            driver.to_owned()
        } else {
            strip_extension(driver, READ_FORMAT_BGRA)
        };

        let tokens = tokenize(&filtered)
            .into_iter()
            .filter_map(|token| CString::new(token).ok())
            .collect();
        let full = CString::new(filtered).unwrap_or_default();

        Self { full, tokens }
    }

    pub fn full(&self) -> &CString {
        &self.full
    }

    pub fn token(&self, index: usize) -> Option<&CString> {
        self.tokens.get(index)
    }

    pub fn count(&self) -> usize {
        self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_extensions_deterministic() {
        let driver = "EGL_KHR_client_get_all_proc_addresses";
        let first = client_extensions(driver);
        let second = client_extensions(driver);
        assert_eq!(first, second);
        assert!(first.starts_with("EGL_KHR_client_get_all_proc_addresses EGL_EXT_platform_base"));
        assert!(first.ends_with("EGL_KHR_platform_wayland "));
    }

    #[test]
    fn test_display_extensions_append_wl_bind() {
        assert_eq!(
            display_extensions("EGL_KHR_image_base"),
            "EGL_KHR_image_base EGL_WL_bind_wayland_display"
        );
        assert!(display_extensions("").contains(WL_BIND_DISPLAY));
    }

    #[test]
    fn test_strip_every_occurrence() {
        let exts = "GL_OES_rgb8_rgba8 GL_EXT_read_format_bgra GL_EXT_read_format_bgra GL_OES_depth24";
        let cache = GlExtensionCache::new(exts, false);
        assert!(!cache.full().to_string_lossy().contains(READ_FORMAT_BGRA));
        assert_eq!(cache.count(), 2);
        assert_eq!(cache.token(0).map(|t| t.as_c_str()), Some(c"GL_OES_rgb8_rgba8"));
        assert_eq!(cache.token(1).map(|t| t.as_c_str()), Some(c"GL_OES_depth24"));
        assert!(cache.token(2).is_none());
    }

    #[test]
    fn test_bgra_kept_when_valid() {
        let cache = GlExtensionCache::new("GL_EXT_read_format_bgra GL_OES_depth24", true);
        assert_eq!(cache.count(), 2);
        assert_eq!(
            cache.full().as_c_str(),
            c"GL_EXT_read_format_bgra GL_OES_depth24"
        );
    }
}
