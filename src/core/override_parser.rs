// src/core/override_parser.rs

use crate::models::{OptionDefinition, OptionMap, OptionType, ParsedOverrides, snake_to_camel};
use serde_json::{Number, Value};
use std::iter::Peekable;

/// Parses command-line `tokens` against a builder's option `definitions`.
///
/// # Logic:
/// - `--name=value`, `--name value` and `-a value` bind to the option with that
///   name or alias. Names compare in camelCase, so `--source-map` finds `sourceMap`.
/// - Boolean options accept a bare flag, an optional `true`/`false` after it,
///   `--name=false` and `--no-name`. Grouped boolean aliases (`-abc`) are allowed.
/// - Bare tokens bind to positional options in index order.
/// - Everything after `--` is passed through untouched.
///
/// This never fails. A token that matches nothing, or whose value does not
/// coerce to the option's type, ends up in `leftovers` in its original order.
pub fn parse_arguments(tokens: &[String], definitions: &[OptionDefinition]) -> ParsedOverrides {
    let mut state = ParserState::new(definitions);
    let mut params_iter = tokens.iter().map(String::as_str).peekable();

    while let Some(token) = params_iter.next() {
        if token == "--" {
            for rest in params_iter.by_ref() {
                state.leave(rest);
            }
            break;
        }

        if let Some(body) = token.strip_prefix("--") {
            state.parse_long(token, body, &mut params_iter);
        } else if let Some(body) = token.strip_prefix('-').filter(|b| !b.is_empty())
            && !looks_numeric(token)
        {
            state.parse_short(token, body, &mut params_iter);
        } else {
            state.bare.push((state.seq, token));
            state.seq += 1;
        }
    }

    state.finish()
}

/// Coerces a raw string into the JSON value `definition` expects.
/// Returns `None` if the string is not a valid value for the option.
pub fn coerce(definition: &OptionDefinition, raw: &str) -> Option<Value> {
    let in_enum =
        |v: &str| definition.enum_values.is_empty() || definition.enum_values.iter().any(|e| e == v);

    match definition.kind {
        OptionType::String | OptionType::Array => {
            in_enum(raw).then(|| Value::String(raw.to_string()))
        }
        OptionType::Boolean => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        OptionType::Number => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        OptionType::Integer => raw.parse::<i64>().ok().map(Value::from),
    }
}

/// Compares two option names the way the parser does (`source-map` == `sourceMap`).
pub fn names_match(left: &str, right: &str) -> bool {
    left == right || snake_to_camel(left) == snake_to_camel(right)
}

fn looks_numeric(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

struct ParserState<'d, 't> {
    definitions: &'d [OptionDefinition],
    options: OptionMap,
    /// Bare tokens awaiting positional binding, tagged with their sequence number.
    bare: Vec<(usize, &'t str)>,
    leftovers: Vec<(usize, &'t str)>,
    seq: usize,
}

impl<'d, 't> ParserState<'d, 't> {
    fn new(definitions: &'d [OptionDefinition]) -> Self {
        Self {
            definitions,
            options: OptionMap::new(),
            bare: Vec::new(),
            leftovers: Vec::new(),
            seq: 0,
        }
    }

    fn leave(&mut self, token: &'t str) {
        log::trace!("Leaving token '{}' unconsumed", token);
        self.leftovers.push((self.seq, token));
        self.seq += 1;
    }

    fn find_by_name(&self, name: &str) -> Option<&'d OptionDefinition> {
        self.definitions.iter().find(|def| {
            names_match(&def.name, name) || def.aliases.iter().any(|a| a.len() > 1 && a == name)
        })
    }

    fn find_by_alias(&self, alias: &str) -> Option<&'d OptionDefinition> {
        self.definitions
            .iter()
            .find(|def| def.aliases.iter().any(|a| a == alias))
    }

    fn parse_long<I>(&mut self, token: &'t str, body: &'t str, rest: &mut Peekable<I>)
    where
        I: Iterator<Item = &'t str>,
    {
        let (name, inline) = split_inline(body);

        if let Some(def) = self.find_by_name(name) {
            self.bind_flag(def, token, inline, rest);
            return;
        }

        if inline.is_none()
            && let Some(def) = name.strip_prefix("no-").and_then(|n| self.find_by_name(n))
            && def.kind == OptionType::Boolean
        {
            self.assign(def, Value::Bool(false));
            return;
        }

        self.leave(token);
    }

    fn parse_short<I>(&mut self, token: &'t str, body: &'t str, rest: &mut Peekable<I>)
    where
        I: Iterator<Item = &'t str>,
    {
        let (name, inline) = split_inline(body);

        if let Some(def) = self.find_by_alias(name) {
            self.bind_flag(def, token, inline, rest);
            return;
        }

        // `-abc` as three boolean aliases, all or nothing.
        if inline.is_none() && name.chars().count() > 1 {
            let grouped: Option<Vec<&'d OptionDefinition>> = name
                .chars()
                .map(|c| {
                    self.find_by_alias(&c.to_string())
                        .filter(|def| def.kind == OptionType::Boolean)
                })
                .collect();
            if let Some(defs) = grouped {
                for def in defs {
                    self.assign(def, Value::Bool(true));
                }
                return;
            }
        }

        self.leave(token);
    }

    fn bind_flag<I>(
        &mut self,
        def: &'d OptionDefinition,
        token: &'t str,
        inline: Option<&'t str>,
        rest: &mut Peekable<I>,
    ) where
        I: Iterator<Item = &'t str>,
    {
        if def.kind == OptionType::Boolean {
            match inline {
                Some(raw) => match coerce(def, raw) {
                    Some(value) => self.assign(def, value),
                    None => self.leave(token),
                },
                None => {
                    let explicit = rest
                        .next_if(|next| *next == "true" || *next == "false")
                        .and_then(|raw| coerce(def, raw));
                    self.assign(def, explicit.unwrap_or(Value::Bool(true)));
                }
            }
            return;
        }

        let (raw, value_token) = match inline {
            Some(raw) => (Some(raw), None),
            None => {
                let next = rest.next_if(|next| !next.starts_with('-') || looks_numeric(next));
                (next, next)
            }
        };

        match raw.and_then(|r| coerce(def, r)) {
            Some(value) => self.assign(def, value),
            None => {
                self.leave(token);
                if let Some(value_token) = value_token {
                    self.leave(value_token);
                }
            }
        }
    }

    fn assign(&mut self, def: &OptionDefinition, value: Value) {
        log::trace!("Binding option '{}' = {}", def.name, value);
        if def.kind == OptionType::Array {
            match self.options.get_mut(&def.name) {
                Some(Value::Array(items)) => items.push(value),
                _ => {
                    self.options.insert(def.name.clone(), Value::Array(vec![value]));
                }
            }
        } else {
            self.options.insert(def.name.clone(), value);
        }
    }

    fn finish(mut self) -> ParsedOverrides {
        let definitions = self.definitions;
        let mut positionals: Vec<&OptionDefinition> = definitions
            .iter()
            .filter(|def| def.positional.is_some())
            .collect();
        positionals.sort_by_key(|def| def.positional);

        // A bare token that does not fit one positional is offered to the next.
        for def in positionals {
            if self.options.contains_key(&def.name) {
                continue;
            }
            let Some(&(_, token)) = self.bare.first() else {
                break;
            };
            if let Some(value) = coerce(def, token) {
                self.assign(def, value);
                self.bare.remove(0);
            }
        }

        self.leftovers.extend(self.bare);
        self.leftovers.sort_by_key(|(seq, _)| *seq);

        ParsedOverrides {
            options: self.options,
            leftovers: self
                .leftovers
                .into_iter()
                .map(|(_, token)| token.to_string())
                .collect(),
        }
    }
}

fn split_inline(body: &str) -> (&str, Option<&str>) {
    match body.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (body, None),
    }
}
