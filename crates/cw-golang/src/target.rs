use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("expected to have a type or a function, but got none")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    Functions,
    Methods,
    Types,
}

/// What to look up: `Type.method`, `function` or `Type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    function_name: Option<String>,
    type_name: Option<String>,
}

impl Target {
    pub fn new_method(type_name: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            function_name: Some(function_name.into()),
            type_name: Some(type_name.into()),
        }
    }

    pub fn new_function(function_name: impl Into<String>) -> Self {
        Self {
            function_name: Some(function_name.into()),
            type_name: None,
        }
    }

    pub fn new_type(type_name: impl Into<String>) -> Self {
        Self {
            function_name: None,
            type_name: Some(type_name.into()),
        }
    }

    /// `pkg.Type.method()`, `Type.method`, or a bare name. A leading package
    /// segment and a trailing `()` are dropped.
    pub fn parse(path: &str) -> Result<Self, TargetError> {
        let path = path.trim().trim_end_matches("()");
        let mut parts: Vec<&str> = path.split('.').filter(|part| !part.is_empty()).collect();
        let function_name = parts.pop().map(str::to_string);
        let type_name = parts.last().map(|part| part.to_string());
        let target = Self {
            function_name,
            type_name,
        };
        target.query_mode()?;
        Ok(target)
    }

    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn query_mode(&self) -> Result<QueryMode, TargetError> {
        match (&self.type_name, &self.function_name) {
            (Some(_), Some(_)) => Ok(QueryMode::Methods),
            (Some(_), None) => Ok(QueryMode::Types),
            (None, Some(_)) => Ok(QueryMode::Functions),
            (None, None) => Err(TargetError::Empty),
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.type_name, &self.function_name) {
            (Some(ty), Some(func)) => write!(f, "{ty}.{func}"),
            (Some(name), None) | (None, Some(name)) => f.write_str(name),
            (None, None) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_paths() {
        assert_eq!(
            Target::parse("pkg.Struct1.method1()").unwrap(),
            Target::new_method("Struct1", "method1")
        );
        assert_eq!(
            Target::parse("Struct1.method2").unwrap(),
            Target::new_method("Struct1", "method2")
        );
        assert_eq!(
            Target::parse(" staticFunction() ").unwrap(),
            Target::new_function("staticFunction")
        );
    }

    #[test]
    fn query_modes() {
        assert_eq!(
            Target::new_method("T", "m").query_mode(),
            Ok(QueryMode::Methods)
        );
        assert_eq!(Target::new_type("T").query_mode(), Ok(QueryMode::Types));
        assert_eq!(Target::parse(""), Err(TargetError::Empty));
        assert_eq!(Target::parse("()"), Err(TargetError::Empty));
    }

    #[test]
    fn displays_without_package() {
        let target = Target::parse("pkg.Struct1.method1()").unwrap();
        assert_eq!(target.to_string(), "Struct1.method1");
    }
}
