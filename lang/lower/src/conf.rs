use serde::{Deserialize, Serialize};

/// Knobs of the lowering; parsed from TOML through `FromStr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LowerConf {
    /// joins the scope names of a lifted declaration
    pub separator: String,
    /// names anonymous functions, as `lambda-0`, `lambda-1`, ...
    pub lambda_prefix: String,
    /// names anonymous classes, as `object-0`, `object-1`, ...
    pub object_prefix: String,
    /// replaces the brackets of special names when they name a captured value
    pub captured_marker: String,
    /// check the lowered program before handing it on
    pub validate: bool,
}

impl Default for LowerConf {
    fn default() -> Self {
        Self {
            separator: "$".to_string(),
            lambda_prefix: "lambda".to_string(),
            object_prefix: "object".to_string(),
            captured_marker: "$".to_string(),
            validate: true,
        }
    }
}

impl std::str::FromStr for LowerConf {
    type Err = toml::de::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl std::fmt::Display for LowerConf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = toml::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", s)
    }
}

impl LowerConf {
    pub fn lambda_name(&self, index: usize) -> String {
        format!("{}-{}", self.lambda_prefix, index)
    }
    pub fn object_name(&self, index: usize) -> String {
        format!("{}-{}", self.object_prefix, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_table_keeps_defaults() {
        let conf: LowerConf = "separator = \"_\"\nvalidate = false".parse().unwrap();
        assert_eq!(conf.separator, "_");
        assert!(!conf.validate);
        assert_eq!(conf.lambda_name(2), "lambda-2");
        assert_eq!(conf.object_name(0), "object-0");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!("sep = \"_\"".parse::<LowerConf>().is_err());
    }

    #[test]
    fn display_reads_back() {
        let conf = LowerConf { lambda_prefix: "fn".to_string(), ..LowerConf::default() };
        let back: LowerConf = conf.to_string().parse().unwrap();
        assert_eq!(back, conf);
    }
}
