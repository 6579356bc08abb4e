use std::sync::RwLock;

/// How the quotient bounds of an interval division are rounded
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DivisionRounding {
    /// Truncate every corner quotient, the way machine integer division does
    TowardZero,
    /// Round the lower corner down and the upper corner up, keeping every rational quotient
    Outward,
}

#[derive(Clone, Debug)]
pub struct AnalysisOption {
    pub division_rounding: DivisionRounding,
}

impl Default for AnalysisOption {
    fn default() -> Self {
        Self {
            division_rounding: DivisionRounding::TowardZero,
        }
    }
}

lazy_static! {
    static ref CURRENT_OPTION: RwLock<AnalysisOption> = RwLock::new(AnalysisOption::default());
}

impl AnalysisOption {
    /// Consumes the recognized options from `args`, leaving the others in place
    pub fn from_args(args: &mut Vec<String>) -> Self {
        let mut indices_to_remove = vec![];
        let mut res = Self::default();
        for (i, arg) in args.iter().enumerate() {
            if let Some(name) = arg.strip_prefix("--") {
                if name == "division_rounding" {
                    match args.get(i + 1).and_then(|v| Self::get_division_rounding(v)) {
                        Some(rounding) => res.division_rounding = rounding,
                        None => warn!("Invalid division rounding, use toward_zero as default"),
                    }
                    indices_to_remove.push(i);
                    if i + 1 < args.len() {
                        indices_to_remove.push(i + 1);
                    }
                }
            }
        }
        indices_to_remove.sort_unstable();
        indices_to_remove.dedup();
        for i in indices_to_remove.into_iter().rev() {
            args.remove(i);
        }
        res
    }

    fn get_division_rounding(arg: &str) -> Option<DivisionRounding> {
        match arg {
            "toward_zero" => Some(DivisionRounding::TowardZero),
            "outward" => Some(DivisionRounding::Outward),
            _ => None,
        }
    }

    /// Makes these options visible to every analysis of the process
    pub fn install(self) {
        let mut current = CURRENT_OPTION.write().unwrap_or_else(|e| e.into_inner());
        debug!("Installing analysis options {:?}", self);
        *current = self;
    }

    pub fn current() -> AnalysisOption {
        CURRENT_OPTION
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_division_rounding_and_removes_it() {
        let mut a = args(&["prog", "--division_rounding", "outward", "input"]);
        let option = AnalysisOption::from_args(&mut a);
        assert_eq!(option.division_rounding, DivisionRounding::Outward);
        assert_eq!(a, args(&["prog", "input"]));
    }

    #[test]
    fn invalid_value_falls_back_to_default() {
        let mut a = args(&["--division_rounding", "sideways"]);
        let option = AnalysisOption::from_args(&mut a);
        assert_eq!(option.division_rounding, DivisionRounding::TowardZero);
        assert!(a.is_empty());
    }

    #[test]
    fn dangling_flag_is_consumed() {
        let mut a = args(&["x", "--division_rounding"]);
        let option = AnalysisOption::from_args(&mut a);
        assert_eq!(option.division_rounding, DivisionRounding::TowardZero);
        assert_eq!(a, args(&["x"]));
    }

    #[test]
    fn unknown_flags_are_kept() {
        let mut a = args(&["--entry", "main"]);
        AnalysisOption::from_args(&mut a);
        assert_eq!(a.len(), 2);
    }
}
