//! Attribute lists
//!
//! EGL passes attribute lists either as `EGLint` (legacy and KHR entry
//! points) or `EGLAttrib` (EGL 1.5 core). Both are decoded into one
//! canonical list and re-encoded at the boundary.

use crate::ffi::{EGLAttrib, EGLint, EGL_NONE};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttribList {
    pairs: Vec<(EGLAttrib, EGLAttrib)>,
}

impl AttribList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `EGL_NONE` terminated `EGLint` list; null is empty
    ///
    /// # Safety
    /// `list` must be null or point to a readable, `EGL_NONE` terminated list.
    pub unsafe fn from_ints(list: *const EGLint) -> Self {
        let mut pairs = Vec::new();
        if !list.is_null() {
            let mut cursor = list;
            while *cursor != EGL_NONE {
                pairs.push((*cursor as EGLAttrib, *cursor.add(1) as EGLAttrib));
                cursor = cursor.add(2);
            }
        }
        Self { pairs }
    }

    /// Decode an `EGL_NONE` terminated `EGLAttrib` list; null is empty
    ///
    /// # Safety
    /// `list` must be null or point to a readable, `EGL_NONE` terminated list.
    pub unsafe fn from_attribs(list: *const EGLAttrib) -> Self {
        let mut pairs = Vec::new();
        if !list.is_null() {
            let mut cursor = list;
            while *cursor != EGL_NONE as EGLAttrib {
                pairs.push((*cursor, *cursor.add(1)));
                cursor = cursor.add(2);
            }
        }
        Self { pairs }
    }

    pub fn push(&mut self, key: EGLint, value: EGLAttrib) {
        self.pairs.push((key as EGLAttrib, value));
    }

    pub fn get(&self, key: EGLint) -> Option<EGLAttrib> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key as EGLAttrib)
            .map(|(_, v)| *v)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// `EGLint` encoding, always `EGL_NONE` terminated. Values wider than
    /// 32 bits are truncated, as the legacy entry points would.
    pub fn to_ints(&self) -> Vec<EGLint> {
        let mut out = Vec::with_capacity(self.pairs.len() * 2 + 1);
        for (key, value) in &self.pairs {
            out.push(*key as EGLint);
            out.push(*value as EGLint);
        }
        out.push(EGL_NONE);
        out
    }

    /// `EGLAttrib` encoding, always `EGL_NONE` terminated
    pub fn to_attribs(&self) -> Vec<EGLAttrib> {
        let mut out = Vec::with_capacity(self.pairs.len() * 2 + 1);
        for (key, value) in &self.pairs {
            out.push(*key);
            out.push(*value);
        }
        out.push(EGL_NONE as EGLAttrib);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::{EGL_CONTEXT_CLIENT_VERSION, EGL_HEIGHT, EGL_WIDTH};

    #[test]
    fn test_ints_to_attribs_and_back() {
        let legacy = [EGL_WIDTH, 64, EGL_HEIGHT, 32, EGL_CONTEXT_CLIENT_VERSION, 2, EGL_NONE];
        let list = unsafe { AttribList::from_ints(legacy.as_ptr()) };
        assert_eq!(list.len(), 3);

        let wide = list.to_attribs();
        assert_eq!(wide.len(), legacy.len());
        let back = unsafe { AttribList::from_attribs(wide.as_ptr()) };
        assert_eq!(back.to_ints(), legacy.to_vec());
    }

    #[test]
    fn test_null_and_empty() {
        let list = unsafe { AttribList::from_ints(std::ptr::null()) };
        assert!(list.is_empty());
        assert_eq!(list.to_ints(), vec![EGL_NONE]);
        assert_eq!(list.to_attribs(), vec![EGL_NONE as EGLAttrib]);
    }

    #[test]
    fn test_get() {
        let mut list = AttribList::new();
        list.push(EGL_CONTEXT_CLIENT_VERSION, 3);
        assert_eq!(list.get(EGL_CONTEXT_CLIENT_VERSION), Some(3));
        assert_eq!(list.get(EGL_WIDTH), None);
    }
}
