//! Request step builder
//!
//! The workhorse step shape: one HTTP call plus its assertions, captures and
//! alias. References like `{env.token}` or `{alias.createUser.body.id}` are
//! resolved inside the thunk when the step actually runs, never at
//! registration time, so a step can point at results that do not exist yet
//! without nesting callbacks.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::common::{Error, Result};
use crate::engine::env::render;
use crate::engine::{RunContext, StepHandle, TaskQueue};
use crate::expect::{expect, lookup, Matcher};
use crate::http::{HttpRequest, Method};

/// Builder for one HTTP request step
#[derive(Debug, Clone)]
pub struct RequestStep {
    name: Option<String>,
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    fixture: Option<String>,
    patch: Option<Map<String, Value>>,
    bearer_env: Option<String>,
    fail_on_status_code: Option<bool>,
    expects: Vec<(String, Matcher)>,
    save_env: Vec<(String, String)>,
    alias: Option<String>,
}

impl RequestStep {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            name: None,
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
            fixture: None,
            patch: None,
            bearer_env: None,
            fail_on_status_code: None,
            expects: Vec::new(),
            save_env: Vec::new(),
            alias: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Step name for the report; defaults to "METHOD path"
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Add a header; the value may contain references
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Inline JSON body; string leaves may contain references
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Load the body from a named fixture
    pub fn fixture(mut self, name: &str) -> Self {
        self.fixture = Some(name.to_string());
        self
    }

    /// Shallow-merge fields over the body after it is built
    pub fn patch(mut self, fields: Map<String, Value>) -> Self {
        self.patch = Some(fields);
        self
    }

    /// Send `Authorization: Bearer <env[key]>`, failing with
    /// `MissingCredential` when the key is unset
    pub fn bearer_from_env(mut self, key: &str) -> Self {
        self.bearer_env = Some(key.to_string());
        self
    }

    /// Override the run-level non-2xx policy for this step
    pub fn fail_on_status_code(mut self, strict: bool) -> Self {
        self.fail_on_status_code = Some(strict);
        self
    }

    /// Expect the response value at `path` to satisfy the matcher
    pub fn expect(mut self, path: &str, matcher: Matcher) -> Self {
        self.expects.push((path.to_string(), matcher));
        self
    }

    /// After the expectations hold, copy the response value at
    /// `response_path` into the run environment under `env_key`
    pub fn save_env(mut self, env_key: &str, response_path: &str) -> Self {
        self.save_env.push((env_key.to_string(), response_path.to_string()));
        self
    }

    /// Publish the response document under this alias
    pub fn alias(mut self, name: &str) -> Self {
        self.alias = Some(name.to_string());
        self
    }

    /// Enqueue onto a suite's queue
    pub fn enqueue(self, queue: &mut TaskQueue) -> StepHandle {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.path));
        let alias = self.alias.clone();
        queue.enqueue(&name, alias.as_deref(), move |ctx| {
            Box::pin(self.execute(ctx))
        })
    }

    async fn execute(self, ctx: &mut RunContext) -> Result<Value> {
        let url = self.build_url(ctx)?;
        let headers = self.build_headers(ctx)?;
        let body = self.build_body(ctx)?;

        let request = HttpRequest {
            method: self.method,
            url: url.clone(),
            headers,
            body,
        };

        let http = Arc::clone(&ctx.http);
        let response = http.send(request).await?;

        let strict = self.fail_on_status_code.unwrap_or(ctx.strict_status);
        if strict && !response.is_success() {
            return Err(Error::UnexpectedStatus {
                status: response.status,
                method: self.method.to_string(),
                url,
            });
        }

        let value = response.into_value();

        for (path, matcher) in &self.expects {
            match lookup(&value, path) {
                Some(actual) => expect(actual, path, matcher)?,
                None => {
                    return Err(Error::assertion(path, describe_absent(matcher), "<absent>"));
                }
            }
        }

        for (env_key, response_path) in &self.save_env {
            let captured = lookup(&value, response_path)
                .ok_or_else(|| Error::BadReference(format!("save_env.{response_path}")))?
                .clone();
            ctx.env.set(env_key, captured);
        }

        Ok(value)
    }

    fn build_url(&self, ctx: &RunContext) -> Result<String> {
        let path = interpolate(&self.path, ctx)?;
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path);
        }
        let base = render(ctx.env.require("base_url")?);
        Ok(format!("{}{}", base.trim_end_matches('/'), path))
    }

    fn build_headers(&self, ctx: &RunContext) -> Result<Vec<(String, String)>> {
        let mut headers = Vec::with_capacity(self.headers.len() + 1);
        for (name, value) in &self.headers {
            headers.push((name.clone(), interpolate(value, ctx)?));
        }
        if let Some(key) = &self.bearer_env {
            let token = render(ctx.env.require_credential(key)?);
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        Ok(headers)
    }

    fn build_body(&self, ctx: &mut RunContext) -> Result<Option<Value>> {
        let mut body = match &self.fixture {
            Some(name) => Some(ctx.fixtures.load(name)?),
            None => self.body.clone(),
        };

        if let Some(body) = body.as_mut() {
            *body = interpolate_value(body, ctx)?;
            if let Some(patch) = &self.patch {
                let target = body.as_object_mut().ok_or_else(|| {
                    Error::Config("body_patch requires an object body".to_string())
                })?;
                for (key, value) in patch {
                    target.insert(key.clone(), interpolate_value(value, ctx)?);
                }
            }
        }

        Ok(body)
    }
}

fn describe_absent(matcher: &Matcher) -> String {
    format!("a value matching {matcher:?}")
}

/// Substitute `{env.key}` and `{alias.name.path}` references in a template
///
/// `{{` and `}}` escape literal braces, like `format!`.
pub(crate) fn interpolate(template: &str, ctx: &RunContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(|c| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if rest.as_bytes()[pos] == b'}' {
            // collapse "}}"; a lone "}" passes through
            out.push('}');
            rest = after.strip_prefix('}').unwrap_or(after);
            continue;
        }
        if let Some(stripped) = after.strip_prefix('{') {
            out.push('{');
            rest = stripped;
            continue;
        }
        let end = after
            .find('}')
            .ok_or_else(|| Error::BadReference(after.to_string()))?;
        out.push_str(&resolve_reference(&after[..end], ctx)?);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Interpolate every string leaf of a JSON document
pub(crate) fn interpolate_value(value: &Value, ctx: &RunContext) -> Result<Value> {
    Ok(match value {
        Value::String(s) => Value::String(interpolate(s, ctx)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| interpolate_value(item, ctx))
                .collect::<Result<_>>()?,
        ),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), interpolate_value(item, ctx)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

fn resolve_reference(token: &str, ctx: &RunContext) -> Result<String> {
    if let Some(key) = token.strip_prefix("env.") {
        return Ok(render(ctx.env.require(key)?));
    }
    if let Some(rest) = token.strip_prefix("alias.") {
        let (name, path) = rest.split_once('.').unwrap_or((rest, ""));
        let result = ctx.aliases.resolve(name)?;
        let value =
            lookup(result, path).ok_or_else(|| Error::BadReference(token.to_string()))?;
        return Ok(render(value));
    }
    Err(Error::BadReference(token.to_string()))
}
