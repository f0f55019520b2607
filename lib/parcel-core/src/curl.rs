//! `curl` command rendering for debug logs.

use std::fmt::Write as _;

use crate::Request;

impl Request {
    /// Render this request as a `curl` command line.
    ///
    /// Headers appear in insertion order with `"` escaped. A UTF-8 body is
    /// passed with `-d '...'` (single quotes escaped as `'\''`); any other
    /// body is passed with `--data-binary $'\xNN...'`.
    ///
    /// # Example
    ///
    /// ```
    /// use parcel_core::{Method, Request};
    ///
    /// let url = url::Url::parse("https://api.example.com/data").unwrap();
    /// let request = Request::builder(Method::Post, url)
    ///     .header("Content-Type", "application/json")
    ///     .body(r#"{"key":"value"}"#)
    ///     .build();
    ///
    /// assert_eq!(
    ///     request.to_curl(),
    ///     r#"curl -X POST "https://api.example.com/data" -H "Content-Type: application/json" -d '{"key":"value"}'"#
    /// );
    /// ```
    #[must_use]
    pub fn to_curl(&self) -> String {
        let mut out = format!("curl -X {} \"{}\"", self.method(), self.url());

        for (name, value) in self.headers().iter() {
            let _ = write!(
                out,
                " -H \"{}: {}\"",
                name.replace('"', "\\\""),
                value.replace('"', "\\\"")
            );
        }

        if let Some(body) = self.body() {
            match std::str::from_utf8(body) {
                Ok(text) => {
                    let _ = write!(out, " -d '{}'", text.replace('\'', r"'\''"));
                }
                Err(_) => {
                    out.push_str(" --data-binary $'");
                    for byte in body {
                        let _ = write!(out, "\\x{byte:02X}");
                    }
                    out.push('\'');
                }
            }
        }

        out
    }
}
