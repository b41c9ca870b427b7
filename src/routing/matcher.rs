//! Route template matching.
//!
//! # Responsibilities
//! - Compile `{param}` / `{param?}` URI and domain templates
//! - Apply `where` constraints to placeholders
//! - Extract parameter values from host and path
//!
//! # Design Decisions
//! - Host matching is case-insensitive (per HTTP spec)
//! - Path matching is case-sensitive, trailing slashes ignored
//! - Constraints are anchored to the whole placeholder value
//! - Named groups are generated (`p0`, `p1`, ...) so user constraints with
//!   their own groups cannot shift parameter positions

use std::collections::BTreeMap;
use std::sync::LazyLock;

use axum::http::Request;
use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::routing::route::RegisteredRoute;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(\w+)(\?)?\}").expect("placeholder pattern is valid")
});

const DEFAULT_SEGMENT: &str = "[^/]+";
const DEFAULT_LABEL: &str = "[^.]+";

/// Placeholder names of a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// One compiled template: the anchored pattern and its parameter names.
#[derive(Debug, Clone)]
pub struct Template {
    pattern: Regex,
    params: Vec<String>,
}

impl Template {
    /// Compile `template`, using `default` for unconstrained placeholders.
    /// An optional placeholder swallows the `separator` in front of it.
    pub fn compile(
        template: &str,
        separator: char,
        default: &str,
        wheres: &BTreeMap<String, String>,
        case_insensitive: bool,
    ) -> Result<Self, regex::Error> {
        let mut pattern = String::from(if case_insensitive { "(?i)^" } else { "^" });
        let mut params = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(template) {
            let whole = caps.get(0).expect("group 0 always present");
            let name = caps[1].to_string();
            let optional = caps.get(2).is_some();
            let constraint = wheres.get(&name).map(String::as_str).unwrap_or(default);
            let group = format!("(?P<p{}>(?:{}))", params.len(), constraint);

            let mut literal = &template[last..whole.start()];
            if optional && literal.ends_with(separator) {
                literal = &literal[..literal.len() - separator.len_utf8()];
                pattern.push_str(&regex::escape(literal));
                pattern.push_str(&format!("(?:{}{})?", regex::escape(&separator.to_string()), group));
            } else {
                pattern.push_str(&regex::escape(literal));
                pattern.push_str(&group);
                if optional {
                    pattern.push('?');
                }
            }

            params.push(name);
            last = whole.end();
        }
        pattern.push_str(&regex::escape(&template[last..]));
        pattern.push('$');

        Ok(Self {
            pattern: Regex::new(&pattern)?,
            params,
        })
    }

    /// Parameter values when `input` matches; absent optionals are omitted.
    /// Values are percent-decoded after the constraints have matched.
    pub fn captures(&self, input: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.pattern.captures(input)?;
        Some(
            self.params
                .iter()
                .enumerate()
                .filter_map(|(i, name)| {
                    caps.name(&format!("p{i}")).map(|m| {
                        let value = percent_decode_str(m.as_str()).decode_utf8_lossy();
                        (name.clone(), value.into_owned())
                    })
                })
                .collect(),
        )
    }
}

/// Matchers for one route, built lazily from its template and constraints.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    path: Template,
    domain: Option<Template>,
}

impl CompiledRoute {
    pub fn compile(route: &RegisteredRoute) -> Result<Self, regex::Error> {
        let template = normalize_path(route.uri());
        let path = Template::compile(template, '/', DEFAULT_SEGMENT, &route.wheres, false)?;
        let domain = route
            .domain
            .as_deref()
            .map(|domain| Template::compile(domain, '.', DEFAULT_LABEL, &route.wheres, true))
            .transpose()?;
        Ok(Self { path, domain })
    }

    /// Match host (if the route is domain-bound) and path.
    pub fn match_parts(&self, host: Option<&str>, path: &str) -> Option<BTreeMap<String, String>> {
        let mut params = match &self.domain {
            Some(domain) => domain.captures(strip_port(host?))?,
            None => BTreeMap::new(),
        };
        params.extend(self.path.captures(normalize_path(path))?);
        Some(params)
    }

    pub fn matches<B>(&self, req: &Request<B>) -> Option<BTreeMap<String, String>> {
        let host = req
            .headers()
            .get("host")
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().host());
        self.match_parts(host, req.uri().path())
    }
}

fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::attributes::Verb;
    use crate::metadata::handler::HandlerRef;
    use axum::body::Body;

    fn route(uri: &str) -> RegisteredRoute {
        RegisteredRoute::new(&[Verb::Get], uri, HandlerRef::new("C", "m"))
    }

    #[test]
    fn test_path_params() {
        let compiled = CompiledRoute::compile(&route("photos/{photo}/comments/{comment}")).unwrap();
        let params = compiled.match_parts(None, "/photos/7/comments/9").unwrap();
        assert_eq!(params["photo"], "7");
        assert_eq!(params["comment"], "9");
        assert!(compiled.match_parts(None, "/photos/7").is_none());
    }

    #[test]
    fn test_encoded_params_are_decoded() {
        let compiled = CompiledRoute::compile(&route("photos/{slug}")).unwrap();
        let params = compiled.match_parts(None, "/photos/summer%20trip%2Fz%C3%BCrich").unwrap();
        assert_eq!(params["slug"], "summer trip/zürich");
    }

    #[test]
    fn test_optional_param() {
        let compiled = CompiledRoute::compile(&route("users/{name?}")).unwrap();
        assert_eq!(compiled.match_parts(None, "/users/bob").unwrap()["name"], "bob");
        assert!(compiled.match_parts(None, "/users").unwrap().is_empty());
    }

    #[test]
    fn test_where_constraint() {
        let mut r = route("photos/{photo}");
        r.set_wheres(BTreeMap::from([("photo".to_string(), "[0-9]+|latest".to_string())]));
        let compiled = CompiledRoute::compile(&r).unwrap();
        assert!(compiled.match_parts(None, "/photos/42").is_some());
        assert!(compiled.match_parts(None, "/photos/latest").is_some());
        assert!(compiled.match_parts(None, "/photos/abc").is_none());
        assert!(compiled.match_parts(None, "/photos/42latest").is_none());
    }

    #[test]
    fn test_root_route() {
        let compiled = CompiledRoute::compile(&route("/")).unwrap();
        assert!(compiled.match_parts(None, "/").is_some());
        assert!(compiled.match_parts(None, "/x").is_none());
    }

    #[test]
    fn test_domain_matcher() {
        let mut r = route("dashboard");
        r.domain = Some("{account}.example.com".into());
        let compiled = CompiledRoute::compile(&r).unwrap();

        let req = Request::builder()
            .uri("/dashboard")
            .header("Host", "ACME.example.com:8080")
            .body(Body::default())
            .unwrap();
        assert_eq!(compiled.matches(&req).unwrap()["account"], "ACME");

        let req = Request::builder()
            .uri("/dashboard")
            .header("Host", "example.org")
            .body(Body::default())
            .unwrap();
        assert!(compiled.matches(&req).is_none());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("a/{b}/c/{d?}"), vec!["b", "d"]);
    }
}
