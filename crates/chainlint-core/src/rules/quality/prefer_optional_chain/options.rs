use serde::Deserialize;

/// Options for `prefer-optional-chain`, read from `[rules.prefer-optional-chain]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferOptionalChainOptions {
    pub require_nullish: bool,
    pub check_any: bool,
    pub check_unknown: bool,
    pub check_string: bool,
    pub check_number: bool,
    pub check_boolean: bool,
    pub check_big_int: bool,
    #[serde(rename = "allowPotentiallyUnsafeFixesThatModifyTheReturnTypeIKnowWhatImDoing")]
    pub allow_unsafe_fixes: bool,
}

impl Default for PreferOptionalChainOptions {
    fn default() -> Self {
        Self {
            require_nullish: false,
            check_any: true,
            check_unknown: true,
            check_string: true,
            check_number: true,
            check_boolean: true,
            check_big_int: true,
            allow_unsafe_fixes: false,
        }
    }
}

impl PreferOptionalChainOptions {
    pub const KNOWN_KEYS: &'static [&'static str] = &[
        "requireNullish",
        "checkAny",
        "checkUnknown",
        "checkString",
        "checkNumber",
        "checkBoolean",
        "checkBigInt",
        "allowPotentiallyUnsafeFixesThatModifyTheReturnTypeIKnowWhatImDoing",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_check_every_category() {
        let options = PreferOptionalChainOptions::default();

        assert!(!options.require_nullish);
        assert!(options.check_any && options.check_unknown);
        assert!(options.check_string && options.check_number);
        assert!(options.check_boolean && options.check_big_int);
        assert!(!options.allow_unsafe_fixes);
    }

    #[test]
    fn deserializes_camel_case_keys_with_defaults() {
        let options: PreferOptionalChainOptions = toml::from_str(
            r#"
requireNullish = true
checkString = false
allowPotentiallyUnsafeFixesThatModifyTheReturnTypeIKnowWhatImDoing = true
"#,
        )
        .unwrap();

        assert!(options.require_nullish);
        assert!(!options.check_string);
        assert!(options.check_number);
        assert!(options.allow_unsafe_fixes);
    }
}
