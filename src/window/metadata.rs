//! Metadata Store
//!
//! Accumulates the server's window metadata and derives the concrete
//! properties the platform window needs. Merging is additive: keys are
//! added or overwritten, never removed.

use std::sync::LazyLock;

use area_remote_proto::{Metadata, MetadataValue};
use regex::{Captures, Regex};

use crate::error::{Result, WindowError};
use crate::window::hints::GeometryHints;
use crate::window::window_type::WindowTypeHint;

/// `@token@` placeholders in title templates
static TITLE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[\w\-]*@").expect("title token pattern is valid"));

/// WM class used when the server sends none
const DEFAULT_WM_CLASS: (&str, &str) = ("xpra", "Xpra");

/// Window icon as sent by the server (still encoded)
#[derive(Debug, Clone, PartialEq)]
pub struct WindowIcon {
    pub width: u32,
    pub height: u32,
    pub encoding: String,
    pub data: Vec<u8>,
}

/// Accumulated window metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    values: Metadata,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite every key present in `update`, keep the rest
    pub fn merge(&mut self, update: Metadata) {
        self.values.extend(update);
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Metadata {
        &self.values
    }

    /// Expand `@token@` placeholders in a title template
    pub fn derive_title(&self, template: &str) -> String {
        if !template.contains('@') {
            return template.to_string();
        }

        TITLE_TOKEN
            .replace_all(template, |caps: &Captures| {
                let token = &caps[0];
                let var = &token[1..token.len() - 1];
                match self.values.get(var) {
                    Some(value) => value.to_display_string(),
                    None => default_title_value(var),
                }
            })
            .into_owned()
    }

    /// Geometry hints from `size-constraints`, if present
    pub fn derive_size_hints(&self) -> Result<Option<GeometryHints>> {
        match self.values.get("size-constraints") {
            Some(value) => GeometryHints::from_size_constraints(value).map(Some),
            None => Ok(None),
        }
    }

    /// Window type hint, only meaningful before the window is mapped
    pub fn derive_window_type(&self, mapped: bool) -> Result<Option<WindowTypeHint>> {
        if mapped || !self.values.contains_key("window-type") {
            return Ok(None);
        }
        let names = self.window_types()?;
        Ok(WindowTypeHint::first_known(names).map(|(_, hint)| hint))
    }

    /// Names listed in `window-type`, in server order
    pub fn window_types(&self) -> Result<Vec<&str>> {
        let Some(value) = self.values.get("window-type") else {
            return Ok(Vec::new());
        };
        let items = value
            .as_list()
            .ok_or_else(|| WindowError::malformed("window-type", "expected a list"))?;
        Ok(items.iter().filter_map(MetadataValue::as_str).collect())
    }

    pub fn derive_icon(&self) -> Result<Option<WindowIcon>> {
        let Some(value) = self.values.get("icon") else {
            return Ok(None);
        };
        let malformed = || WindowError::malformed("icon", "expected (width, height, encoding, data)");

        let [width, height, encoding, data] = value.as_list().ok_or_else(malformed)? else {
            return Err(malformed());
        };

        let dimension = |v: &MetadataValue| {
            v.as_int()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(malformed)
        };

        Ok(Some(WindowIcon {
            width: dimension(width)?,
            height: dimension(height)?,
            encoding: encoding.as_str().ok_or_else(malformed)?.to_string(),
            data: data.as_bytes().ok_or_else(malformed)?.to_vec(),
        }))
    }

    pub fn derive_transient_parent(&self) -> Result<Option<u32>> {
        let Some(value) = self.values.get("transient-for") else {
            return Ok(None);
        };
        value
            .as_int()
            .and_then(|wid| u32::try_from(wid).ok())
            .map(Some)
            .ok_or_else(|| WindowError::malformed("transient-for", format!("bad window id {:?}", value)))
    }

    pub fn derive_modal(&self) -> bool {
        self.values.get("modal").is_some_and(MetadataValue::is_truthy)
    }

    /// `(instance, class)` from `class-instance`
    pub fn derive_wm_class(&self) -> Result<(String, String)> {
        let Some(value) = self.values.get("class-instance") else {
            return Ok((DEFAULT_WM_CLASS.0.to_string(), DEFAULT_WM_CLASS.1.to_string()));
        };
        match value.as_pair() {
            Some((instance, class)) => Ok((instance.to_display_string(), class.to_display_string())),
            None => Err(WindowError::malformed("class-instance", "expected a pair")),
        }
    }
}

fn default_title_value(var: &str) -> String {
    match var {
        "title" => "<untitled window>".to_string(),
        "client-machine" => "<unknown machine>".to_string(),
        other => format!("<unknown {}>", other),
    }
}
