//! Benchmarks and the task family each one belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of environment an agent acts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFamily {
    /// Search/Lookup/Finish over a docstore.
    Qa,
    /// Calculate/Finish over python code.
    Math,
    /// Implement/Test/Finish over python code.
    Code,
}

impl TaskFamily {
    /// Action keywords the family accepts, in the order they are listed to the model.
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            Self::Qa => &["Search", "Lookup", "Finish"],
            Self::Math => &["Calculate", "Finish"],
            Self::Code => &["Implement", "Test", "Finish"],
        }
    }

    /// Whether actions carry a fenced python block instead of `Type[arg]`.
    pub fn uses_code(&self) -> bool {
        matches!(self, Self::Math | Self::Code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Benchmark {
    HotpotQa,
    Fever,
    TriviaQa,
    AmbigNq,
    Gsm8k,
    Svamp,
    TabMwp,
    HumanEval,
    Mbpp,
}

impl Benchmark {
    pub const ALL: [Benchmark; 9] = [
        Self::HotpotQa,
        Self::Fever,
        Self::TriviaQa,
        Self::AmbigNq,
        Self::Gsm8k,
        Self::Svamp,
        Self::TabMwp,
        Self::HumanEval,
        Self::Mbpp,
    ];

    pub fn family(&self) -> TaskFamily {
        match self {
            Self::HotpotQa | Self::Fever | Self::TriviaQa | Self::AmbigNq => TaskFamily::Qa,
            Self::Gsm8k | Self::Svamp | Self::TabMwp => TaskFamily::Math,
            Self::HumanEval | Self::Mbpp => TaskFamily::Code,
        }
    }

    /// Lowercase name, also the key for few-shot example files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HotpotQa => "hotpotqa",
            Self::Fever => "fever",
            Self::TriviaQa => "triviaqa",
            Self::AmbigNq => "ambignq",
            Self::Gsm8k => "gsm8k",
            Self::Svamp => "svamp",
            Self::TabMwp => "tabmwp",
            Self::HumanEval => "humaneval",
            Self::Mbpp => "mbpp",
        }
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Benchmark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', '_'], "");
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|b| b.as_str()).collect();
                format!("unknown benchmark '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families() {
        assert_eq!(Benchmark::HotpotQa.family(), TaskFamily::Qa);
        assert_eq!(Benchmark::AmbigNq.family(), TaskFamily::Qa);
        assert_eq!(Benchmark::TabMwp.family(), TaskFamily::Math);
        assert_eq!(Benchmark::Mbpp.family(), TaskFamily::Code);
    }

    #[test]
    fn parse_names() {
        assert_eq!("HotpotQA".parse::<Benchmark>().unwrap(), Benchmark::HotpotQa);
        assert_eq!("human-eval".parse::<Benchmark>().unwrap(), Benchmark::HumanEval);
        assert_eq!("gsm8k".parse::<Benchmark>().unwrap(), Benchmark::Gsm8k);
        let err = "mmlu".parse::<Benchmark>().unwrap_err();
        assert!(err.contains("hotpotqa"));
    }

    #[test]
    fn names_roundtrip() {
        for b in Benchmark::ALL {
            assert_eq!(b.to_string().parse::<Benchmark>().unwrap(), b);
        }
    }

    #[test]
    fn action_keywords() {
        assert!(TaskFamily::Code.actions().contains(&"Test"));
        assert!(!TaskFamily::Qa.uses_code());
        assert!(TaskFamily::Math.uses_code());
    }
}
