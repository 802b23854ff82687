use crate::core::models::Dependency;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

// All statement patterns are anchored at the start of a line: the input is
// printed by oxc, which puts every top-level import/export on its own line.

static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^([ \t]*)import\s+(?:([A-Za-z_$][\w$]*)\s*(?:,\s*)?)?(?:\*\s*as\s+([A-Za-z_$][\w$]*)\s*|\{([^}]*)\}\s*)?from\s*['"]([^'"]+)['"][ \t]*;?"#,
    )
    .unwrap()
});

static IMPORT_SIDE_EFFECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^([ \t]*)import\s*['"]([^'"]+)['"][ \t]*;?"#).unwrap()
});

static EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^([ \t]*)export\s*(?:\*\s*(?:as\s+([A-Za-z_$][\w$]*)\s*)?|\{([^}]*)\}\s*)from\s*['"]([^'"]+)['"][ \t]*;?"#,
    )
    .unwrap()
});

static EXPORT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^([ \t]*)export\s*\{([^}]*)\}[ \t]*;?"#).unwrap());

static EXPORT_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^([ \t]*)export\s+default\s+(?:((?:async\s+)?function\b(?:\s*\*)?|class\b)\s*([A-Za-z_$][\w$]*)?)?"#,
    )
    .unwrap()
});

static EXPORT_FUNCTION_OR_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^([ \t]*)export\s+((?:async\s+)?function\b(?:\s*\*)?\s*([A-Za-z_$][\w$]*)|class\s+([A-Za-z_$][\w$]*))"#,
    )
    .unwrap()
});

static EXPORT_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^([ \t]*)export\s+(const|let|var)\s+([^\n]*)"#).unwrap());

// `require('x')`, but not `foo.require('x')`
static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(^|[^.\w$])require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap()
});

/// A module body ready to be wrapped in
/// `function (module, exports, __stitch_require) { ... }`.
#[derive(Debug, Clone, Default)]
pub struct LoweredModule {
    pub code: String,
    pub prelude_lines: usize,
    pub exports: Vec<String>,
    pub star_exports: Vec<Dependency>,
    pub external_imports: Vec<String>,
}

/// Every specifier the module imports, re-exports or requires, in order of
/// first appearance.
pub fn collect_specifiers(code: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();

    let mut collect = |regex: &Regex, group: usize| {
        for caps in regex.captures_iter(code) {
            if let Some(m) = caps.get(group) {
                found.push((m.start(), m.as_str().to_string()));
            }
        }
    };
    collect(&*IMPORT_FROM, 5);
    collect(&*IMPORT_SIDE_EFFECT, 2);
    collect(&*EXPORT_FROM, 4);
    collect(&*REQUIRE_CALL, 2);

    found.sort_by_key(|(position, _)| *position);

    let mut specifiers: Vec<String> = Vec::with_capacity(found.len());
    for (_, specifier) in found {
        if !specifiers.contains(&specifier) {
            specifiers.push(specifier);
        }
    }
    specifiers
}

/// Rewrite ES module syntax into registry form: imports become
/// `__stitch_require(id)` lookups, exports become getters on `exports`.
///
/// Line count is preserved so the transformed code keeps a line-for-line
/// relation with the input; everything the lowering adds goes into a
/// prelude of `prelude_lines` lines.
pub fn lower(code: &str, dependencies: &HashMap<String, Dependency>) -> LoweredModule {
    let mut lowering = Lowering {
        dependencies,
        exports: Vec::new(),
        getters: Vec::new(),
        star_exports: Vec::new(),
        external_imports: Vec::new(),
        temp_counter: 0,
        is_module: false,
    };

    let code = replace_keeping_lines(&EXPORT_FROM, code, |caps| lowering.export_from(caps));
    let code = replace_keeping_lines(&EXPORT_LIST, &code, |caps| lowering.export_list(caps));
    let code = replace_keeping_lines(&EXPORT_DEFAULT, &code, |caps| lowering.export_default(caps));
    let code = replace_keeping_lines(&EXPORT_FUNCTION_OR_CLASS, &code, |caps| {
        lowering.export_declaration(caps)
    });
    let code = replace_keeping_lines(&EXPORT_VARIABLE, &code, |caps| lowering.export_variable(caps));
    let code = replace_keeping_lines(&IMPORT_FROM, &code, |caps| lowering.import_from(caps));
    let code = replace_keeping_lines(&IMPORT_SIDE_EFFECT, &code, |caps| {
        lowering.import_side_effect(caps)
    });
    let code = REQUIRE_CALL
        .replace_all(&code, |caps: &Captures| lowering.require_call(caps))
        .into_owned();

    lowering.finish(code)
}

struct Lowering<'a> {
    dependencies: &'a HashMap<String, Dependency>,
    exports: Vec<String>,
    getters: Vec<(String, String)>,
    star_exports: Vec<Dependency>,
    external_imports: Vec<String>,
    temp_counter: usize,
    is_module: bool,
}

impl Lowering<'_> {
    fn finish(self, code: String) -> LoweredModule {
        let mut prelude: Vec<String> = Vec::new();
        if self.is_module {
            prelude.push("Object.defineProperty(exports, '__esModule', { value: true });".to_string());
        }
        for (name, expression) in &self.getters {
            prelude.push(format!(
                "Object.defineProperty(exports, {}, {{ enumerable: true, get: function () {{ return {}; }} }});",
                js_string(name),
                expression
            ));
        }

        let prelude_lines = prelude.len();
        let code = if prelude.is_empty() {
            code
        } else {
            format!("{}\n{}", prelude.join("\n"), code)
        };

        LoweredModule {
            code,
            prelude_lines,
            exports: self.exports,
            star_exports: self.star_exports,
            external_imports: self.external_imports,
        }
    }

    fn next_temp(&mut self, kind: &str) -> String {
        let name = format!("__stitch_{}_{}", kind, self.temp_counter);
        self.temp_counter += 1;
        name
    }

    fn dependency(&self, specifier: &str) -> Dependency {
        self.dependencies
            .get(specifier)
            .cloned()
            .unwrap_or_else(|| Dependency::External(specifier.to_string()))
    }

    /// Expression evaluating to the exports of `specifier`
    fn module_expression(&mut self, specifier: &str) -> String {
        match self.dependency(specifier) {
            Dependency::Internal(id) => format!("__stitch_require({})", id),
            Dependency::External(external) => {
                if !self.external_imports.contains(&external) {
                    self.external_imports.push(external.clone());
                }
                format!("__stitch_external({})", js_string(&external))
            }
        }
    }

    fn add_export(&mut self, name: &str, expression: String) {
        if self.exports.iter().any(|e| e == name) {
            return;
        }
        self.exports.push(name.to_string());
        self.getters.push((name.to_string(), expression));
    }

    fn import_from(&mut self, caps: &Captures) -> String {
        self.is_module = true;
        let indent = &caps[1];
        let source = self.module_expression(&caps[5]);
        let default = caps.get(2).map(|m| m.as_str().to_string());
        let namespace = caps.get(3).map(|m| m.as_str().to_string());
        let named = caps
            .get(4)
            .map(|m| parse_specifier_list(m.as_str()))
            .unwrap_or_default();

        if default.is_none() && namespace.is_none() && named.is_empty() {
            return format!("{}{};", indent, source);
        }

        let temp = self.next_temp("imp");
        let mut bindings = vec![format!("{} = {}", temp, source)];
        if let Some(local) = default {
            bindings.push(format!("{} = __stitch_interop({}).default", local, temp));
        }
        if let Some(local) = namespace {
            bindings.push(format!("{} = __stitch_namespace({})", local, temp));
        }
        for (imported, local) in named {
            bindings.push(format!("{} = {}", local, member(&temp, &imported)));
        }

        format!("{}var {};", indent, bindings.join(", "))
    }

    fn import_side_effect(&mut self, caps: &Captures) -> String {
        self.is_module = true;
        let source = self.module_expression(&caps[2]);
        format!("{}{};", &caps[1], source)
    }

    fn export_from(&mut self, caps: &Captures) -> String {
        self.is_module = true;
        let indent = &caps[1];
        let specifier = &caps[4];
        let source = self.module_expression(specifier);

        if let Some(list) = caps.get(3) {
            let temp = self.next_temp("re");
            for (imported, exported) in parse_specifier_list(list.as_str()) {
                self.add_export(&exported, member(&temp, &imported));
            }
            return format!("{}var {} = {};", indent, temp, source);
        }

        if let Some(namespace) = caps.get(2) {
            let temp = self.next_temp("re");
            self.add_export(namespace.as_str(), temp.clone());
            return format!("{}var {} = {};", indent, temp, source);
        }

        let dependency = self.dependency(specifier);
        self.star_exports.push(dependency);
        format!("{}__stitch_export_star(exports, {});", indent, source)
    }

    fn export_list(&mut self, caps: &Captures) -> String {
        self.is_module = true;
        for (local, exported) in parse_specifier_list(&caps[2]) {
            self.add_export(&exported, local);
        }
        caps[1].to_string()
    }

    fn export_default(&mut self, caps: &Captures) -> String {
        self.is_module = true;
        let indent = &caps[1];
        let keyword = caps.get(2).map(|m| m.as_str());
        let name = caps.get(3).map(|m| m.as_str());

        match (keyword, name) {
            (Some(keyword), Some(name)) if name != "extends" => {
                self.add_export("default", name.to_string());
                format!("{}{} {}", indent, keyword, name)
            }
            (Some(keyword), Some(name)) => {
                self.mark_default();
                format!("{}exports.default = {} {}", indent, keyword, name)
            }
            (Some(keyword), None) => {
                self.mark_default();
                format!("{}exports.default = {} ", indent, keyword)
            }
            (None, _) => {
                self.mark_default();
                format!("{}exports.default = ", indent)
            }
        }
    }

    fn mark_default(&mut self) {
        if !self.exports.iter().any(|e| e == "default") {
            self.exports.push("default".to_string());
        }
    }

    fn export_declaration(&mut self, caps: &Captures) -> String {
        self.is_module = true;
        if let Some(name) = caps.get(3).or_else(|| caps.get(4)) {
            self.add_export(name.as_str(), name.as_str().to_string());
        }
        format!("{}{}", &caps[1], &caps[2])
    }

    fn export_variable(&mut self, caps: &Captures) -> String {
        self.is_module = true;
        let declarations = &caps[3];
        for declarator in split_top_level(declarations, ',') {
            for name in binding_names(declarator) {
                self.add_export(&name, name.clone());
            }
        }
        format!("{}{} {}", &caps[1], &caps[2], declarations)
    }

    fn require_call(&mut self, caps: &Captures) -> String {
        match self.dependencies.get(&caps[2]) {
            Some(Dependency::Internal(id)) => format!("{}__stitch_require({})", &caps[1], id),
            // left to the host environment's require
            _ => caps[0].to_string(),
        }
    }
}

fn replace_keeping_lines<F>(regex: &Regex, code: &str, mut replace: F) -> String
where
    F: FnMut(&Captures) -> String,
{
    regex
        .replace_all(code, |caps: &Captures| {
            let replacement = replace(caps);
            let lost = caps[0]
                .matches('\n')
                .count()
                .saturating_sub(replacement.matches('\n').count());
            format!("{}{}", replacement, "\n".repeat(lost))
        })
        .into_owned()
}

fn member(object: &str, property: &str) -> String {
    if property == "default" {
        format!("__stitch_interop({}).default", object)
    } else {
        format!("{}.{}", object, property)
    }
}

/// JSON string literal, which is also a valid JS string literal
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// `a, b as c, default as d` → [(a, a), (b, c), (default, d)]
fn parse_specifier_list(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|specifier| {
            let specifier = specifier.strip_prefix("type ").unwrap_or(specifier).trim();
            let mut parts = specifier.split_whitespace();
            let imported = parts.next()?.to_string();
            let local = match (parts.next(), parts.next()) {
                (Some("as"), Some(local)) => local.to_string(),
                _ => imported.clone(),
            };
            Some((imported, local))
        })
        .collect()
}

/// Names bound by a declarator or destructuring pattern
fn binding_names(pattern: &str) -> Vec<String> {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix("...").unwrap_or(pattern);

    match pattern.chars().next() {
        Some(open @ ('{' | '[')) => {
            let inner = match matching_close(pattern) {
                Some(end) => &pattern[1..end],
                None => &pattern[1..],
            };
            split_top_level(inner, ',')
                .into_iter()
                .flat_map(|element| {
                    let target = if open == '{' {
                        split_top_level_once(element, ':')
                            .map(|(_, value)| value)
                            .unwrap_or(element)
                    } else {
                        element
                    };
                    binding_names(target)
                })
                .collect()
        }
        _ => leading_identifier(pattern).into_iter().collect(),
    }
}

fn leading_identifier(text: &str) -> Option<String> {
    let identifier: String = text
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .collect();

    match identifier.chars().next() {
        Some(first) if !first.is_ascii_digit() => Some(identifier),
        _ => None,
    }
}

/// Byte offsets of `separator` outside brackets and string literals
pub(crate) fn top_level_positions(text: &str, separator: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => positions.push(index),
            _ => {}
        }
    }

    positions
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for position in top_level_positions(text, separator) {
        parts.push(&text[start..position]);
        start = position + separator.len_utf8();
    }
    parts.push(&text[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

fn split_top_level_once(text: &str, separator: char) -> Option<(&str, &str)> {
    let position = *top_level_positions(text, separator).first()?;
    Some((&text[..position], &text[position + separator.len_utf8()..]))
}

/// Index of the bracket closing the one `text` starts with
pub(crate) fn matching_close(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}
