use std::env;

/// Expand environment variables in a string using ${VAR_NAME} syntax
pub fn expand_env_var_in_string(value: &str) -> String {
    let mut result = value.to_string();
    let re = match regex::Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return result,
    };

    for cap in re.captures_iter(value) {
        let var_name = &cap[1];
        let replacement = env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name));
        result = result.replace(&cap[0], &replacement);
    }

    result
}

/// Expand `${VAR}` in an optional config value, dropping it if it expands to
/// nothing.
pub fn expand_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| expand_env_var_in_string(&v))
        .filter(|v| !v.trim().is_empty())
}
