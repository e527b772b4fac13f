use regex::Regex;

/// Extracts the first GitHub profile URL found in the CV text.
pub fn extract_github_url(text: &str) -> Option<String> {
	let re = Regex::new(r"https?://github\.com/\S+").ok()?;

	re.find(text).map(|found| found.as_str().trim_end_matches(['.', ',', ')']).to_string())
}

/// Extracts the username segment from a GitHub profile URL.
pub fn extract_username(github_url: &str) -> Option<String> {
	let re = Regex::new(r"^https?://github\.com/([^/\s]+)/?").ok()?;

	re.captures(github_url).map(|captures| captures[1].to_string())
}
