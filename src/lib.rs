use std::{collections::HashMap, error::Error, fmt};

use serde::{
    de::{DeserializeOwned, Deserializer},
    Deserialize,
};

pub mod ast;
mod ast_util;
pub mod lints;
pub mod parser;

#[cfg(test)]
mod test_util;

use ast::SyntaxTree;
use lints::{Diagnostic, Lint, Severity};

pub use parser::{parse, SyntaxError};

#[derive(Debug)]
pub enum CheckerError {
    ConfigDeserializeError {
        name: &'static str,
        problem: Box<dyn Error>,
    },

    LintNewError {
        name: &'static str,
        problem: Box<dyn Error>,
    },
}

impl fmt::Display for CheckerError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            CheckerError::ConfigDeserializeError { name, problem } => write!(
                formatter,
                "[{name}] Configuration was incorrectly formatted: {problem}",
            ),

            CheckerError::LintNewError { name, problem } => write!(formatter, "[{name}] {problem}"),
        }
    }
}

impl Error for CheckerError {}

#[derive(Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct CheckerConfig<V> {
    pub config: HashMap<String, V>,
    #[serde(alias = "rules")]
    pub lints: HashMap<String, LintVariation>,
}

// Necessary because #[derive(Default)] would bind V: Default
impl<V> Default for CheckerConfig<V> {
    fn default() -> Self {
        CheckerConfig {
            config: HashMap::new(),
            lints: HashMap::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LintVariation {
    Allow,
    Deny,
    Warn,
}

impl LintVariation {
    pub fn to_severity(self) -> Severity {
        match self {
            LintVariation::Allow => Severity::Allow,
            LintVariation::Deny => Severity::Error,
            LintVariation::Warn => Severity::Warning,
        }
    }
}

pub struct Checker<V: 'static + DeserializeOwned> {
    config: CheckerConfig<V>,

    lints: Lints,
}

impl<V: 'static + DeserializeOwned> Checker<V> {
    pub fn new(mut config: CheckerConfig<V>) -> Result<Self, CheckerError>
    where
        V: for<'de> Deserializer<'de>,
    {
        Ok(Self {
            lints: Lints::new(&mut config)?,

            config,
        })
    }

    pub fn test_on(&self, tree: &SyntaxTree) -> Vec<CheckerDiagnostic> {
        self.lints.test_on(tree, self)
    }

    pub fn get_lint_severity<L: Lint>(&self, _lint: &L, name: &'static str) -> Severity {
        match self.config.lints.get(name) {
            Some(variation) => variation.to_severity(),
            None => L::SEVERITY,
        }
    }
}

macro_rules! use_lints {
    {
        $(
            $lint_name:ident: $lint_path:ty,
        )+
    } => {
        lazy_static::lazy_static! {
            static ref ALL_LINTS: Vec<&'static str> = vec![
                $(
                    stringify!($lint_name),
                )+
            ];
        }

        pub struct Lints {
            $(
                pub $lint_name: $lint_path,
            )+
        }

        impl Lints {
            fn new<V: 'static + DeserializeOwned>(config: &mut CheckerConfig<V>) -> Result<Self, CheckerError>
            where
                V: for<'de> Deserializer<'de>,
            {
                macro_rules! lint_field {
                    ($name:ident, $path:ty) => {{
                        let lint_name = stringify!($name);

                        let lint = <$path>::new({
                            match config.config.remove(lint_name) {
                                Some(entry_generic) => {
                                    <$path as Lint>::Config::deserialize(entry_generic).map_err(|error| {
                                        CheckerError::ConfigDeserializeError {
                                            name: lint_name,
                                            problem: Box::new(error),
                                        }
                                    })?
                                }

                                None => {
                                    <$path as Lint>::Config::default()
                                }
                            }
                        }).map_err(|error| {
                            CheckerError::LintNewError {
                                name: stringify!($name),
                                problem: Box::new(error),
                            }
                        })?;

                        lint
                    }};
                }

                Ok(Self {
                    $(
                        $lint_name: {
                            lint_field!($lint_name, $lint_path)
                        },
                    )+
                })
            }

            fn test_on<V: 'static + DeserializeOwned>(&self, tree: &SyntaxTree, checker: &Checker<V>) -> Vec<CheckerDiagnostic> {
                let mut diagnostics = Vec::new();

                macro_rules! check_lint {
                    ($name:ident) => {
                        let lint = &self.$name;
                        let severity = checker.get_lint_severity(lint, stringify!($name));

                        if severity != Severity::Allow {
                            let lint_pass = {
                                profiling::scope!(&format!("lint: {}", stringify!($name)));
                                lint.pass(tree)
                            };

                            diagnostics.extend(&mut lint_pass.into_iter().map(|diagnostic| {
                                CheckerDiagnostic {
                                    diagnostic,
                                    severity,
                                }
                            }));
                        }
                    };
                }

                $(
                    check_lint!($lint_name);
                )+

                diagnostics
            }
        }
    };
}

#[derive(Debug)]
pub struct CheckerDiagnostic {
    pub diagnostic: Diagnostic,
    pub severity: Severity,
}

pub fn lint_exists(name: &str) -> bool {
    ALL_LINTS.contains(&name)
}

use_lints! {
    no_excess_parens: lints::no_excess_parens::NoExcessParensLint,
}
