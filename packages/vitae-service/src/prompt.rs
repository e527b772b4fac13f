use vitae_providers::projects::Project;

use crate::search::Candidate;

pub const STRUCTURING_SYSTEM: &str = "Respond to the request and extract structured data.";

pub const EXPANSION_SYSTEM: &str =
	"You rewrite search queries. Respond with JSON only, no commentary.";

pub const RERANK_SYSTEM: &str =
	"You score how well candidate profiles match a job description. Respond with one line per candidate, nothing else.";

const TRUNCATION_MARKER: &str = "\n[Prompt truncated due to length.]";

/// Fixed template for turning raw CV text into a hierarchical profile.
///
/// The section list and language mandate mirror the recruiting pipeline this
/// feeds: Italian keys and values, nested objects and arrays, nothing
/// invented, nothing empty.
pub fn structuring_prompt(extracted_text: &str, projects: &[Project]) -> String {
	let projects_json =
		serde_json::to_string_pretty(projects).unwrap_or_else(|_| "[]".to_string());

	format!(
		"\
Structure the following CV into a single valid JSON object.

Guidelines:
- Use a hierarchical structure: nested objects and arrays where appropriate.
- All keys and values must be in Italian, including the keys themselves.
- Extract every useful detail from the CV; do not summarize away information.
- Never invent information. The output must exactly reflect the original CV.
- Skip any section that is missing or empty. Never emit empty keys, empty
  strings, empty arrays, or null values.
- Respond with the JSON object only, no commentary.

Sections to include when present:
- informazioni_personali: nome_completo, contatti (email, telefoni,
  social_media), indirizzo (indirizzo, città_residenza, cap, paese_residenza),
  nazionalità, data_nascita, titolo_professionale, posizione_interesse,
  seniority, disponibilità, link_github.
- sommario_esecutivo: a comprehensive overview of the full professional
  picture, not a summary.
- approfondimenti_profilo: skills, career progression, areas of expertise,
  market alignment, unique skillset.
- competenze_tecniche: technical skills with proficiency where stated.
- esperienza_professionale: array of {{azienda, ruolo, periodo,
  responsabilità, risultati}}.
- formazione: titoli, istituzioni, date_laurea, certificazioni, onorificenze.
- lingue: array of {{lingua, livello, conoscenza_specializzata}}.
- progetti: the top 4 most relevant projects, each {{nome_progetto,
  descrizione, tecnologie_utilizzate, ruolo, impatto, link_repository}}.
- informazioni_aggiuntive: anything else that contributes to the profile.

CV text:
{extracted_text}

Public projects (JSON):
{projects_json}"
	)
}

/// Asks for paraphrased variants of a job-description query, JSON only.
pub fn expansion_prompt(query: &str, max_queries: u32) -> String {
	format!(
		"\
Rewrite the search query below into up to {max_queries} alternative phrasings
that could retrieve the same candidate profiles from a vector index. Keep the
language of the original query. Respond with a JSON object of the form
{{\"queries\": [\"...\"]}} and nothing else.

Query:
{query}"
	)
}

/// One batched prompt scoring every stage-1 candidate against the job
/// description. Batching keeps the relative scores consistent.
pub fn rerank_prompt(job_description: &str, candidates: &[Candidate]) -> String {
	let mut out = format!(
		"\
Score each candidate profile below against the job description.

Scoring rubric (0.0 to 1.0):
- 1.0: excellent fit for the role.
- 0.8: very good fit.
- 0.5: partial fit.
- below 0.3: weak fit.

Respond with exactly one line per candidate, in the form:
<identifier>, <score>, <short reason>

Do not repeat an identifier. Do not add any other text.

Job description:
{job_description}

Candidates:
"
	);

	for candidate in candidates {
		out.push_str(&format!("\nDocument ID: {}\n{}\n---\n", candidate.profile_id, candidate.text));
	}

	out
}

/// Enforces the prompt character budget. Returns the (possibly truncated)
/// prompt and whether truncation happened.
pub fn truncate_prompt(prompt: String, char_budget: usize) -> (String, bool) {
	if prompt.chars().count() <= char_budget {
		return (prompt, false);
	}

	let mut truncated: String = prompt.chars().take(char_budget).collect();

	truncated.push_str(TRUNCATION_MARKER);

	(truncated, true)
}
