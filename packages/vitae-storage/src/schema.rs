pub fn render_schema() -> String {
	"\
CREATE TABLE IF NOT EXISTS candidate_profiles (
\tprofile_id UUID PRIMARY KEY,
\tsource_name TEXT NOT NULL,
\trecord JSONB NOT NULL,
\tcreated_at TIMESTAMPTZ NOT NULL
);
CREATE TABLE IF NOT EXISTS attachments (
\tprofile_id UUID PRIMARY KEY,
\tbytes BYTEA NOT NULL,
\tcreated_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS candidate_profiles_created_at_idx
\tON candidate_profiles (created_at)"
		.to_string()
}
