use std::fmt;

/// One step from a container value to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Object attribute by name
    Attribute(String),
    /// List, set or tuple element by position
    Index(usize),
    /// Map element by key
    Key(String),
}

/// Location of a nested value, used to point validation errors at the
/// element that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    /// The empty path, addressing the top-level value
    pub fn root() -> Self {
        Path::default()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns a copy of this path with `step` appended.
    pub fn child(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Path { steps }
    }

    /// Adds `step` in front of the existing steps. Errors are raised at the
    /// innermost value and gain their parents while unwinding.
    pub(crate) fn prepend(&mut self, step: PathStep) {
        self.steps.insert(0, step);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("(root)");
        }
        for step in &self.steps {
            match step {
                PathStep::Attribute(name) => write!(f, ".{name}")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
                PathStep::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(Path::root().to_string(), "(root)");
        assert!(Path::root().is_root());
    }

    #[test]
    fn test_nested_display() {
        let path = Path::root()
            .child(PathStep::Attribute("config".to_string()))
            .child(PathStep::Key("timeout".to_string()))
            .child(PathStep::Index(2));
        assert_eq!(path.to_string(), ".config[\"timeout\"][2]");
    }

    #[test]
    fn test_prepend_builds_outward() {
        let mut path = Path::root().child(PathStep::Index(1));
        path.prepend(PathStep::Attribute("ports".to_string()));
        assert_eq!(path.to_string(), ".ports[1]");
    }
}
