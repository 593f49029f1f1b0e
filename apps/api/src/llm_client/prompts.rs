//! Prompt templates and the placeholder substitution engine.

/// System instruction sent with every tailoring call.
pub const TAILOR_SYSTEM: &str =
    "You are a helpful assistant that rewrites CVs in structured JSON.";

/// Values substituted into a tailoring prompt template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptFields<'a> {
    pub base_cv: &'a str,
    pub job_title: &'a str,
    pub job_company: &'a str,
    pub job_location: &'a str,
    pub job_description: &'a str,
}

/// Replaces every occurrence of each recognized placeholder with its field
/// value. Unrecognized placeholders are left verbatim.
pub fn render(template: &str, fields: &PromptFields) -> String {
    template
        .replace("{{BASE_CV}}", fields.base_cv)
        .replace("{{JOB_TITLE}}", fields.job_title)
        .replace("{{JOB_COMPANY}}", fields.job_company)
        .replace("{{JOB_LOCATION}}", fields.job_location)
        .replace("{{JOB_DESCRIPTION}}", fields.job_description)
}

/// Built-in tailoring prompt, used when no custom template is configured.
/// Spells out the exact output JSON shape and forbids invented experience.
pub const DEFAULT_TAILOR_PROMPT: &str = r#"You are an expert CV writer.

USER'S BASE CV (to be improved and tailored):
---
{{BASE_CV}}
---

JOB DESCRIPTION:
Title: {{JOB_TITLE}}
Company: {{JOB_COMPANY}}
Location: {{JOB_LOCATION}}
Description:
{{JOB_DESCRIPTION}}

TASK:
Rewrite and improve the user's CV so it is tailored to this specific job, without inventing experience.

OUTPUT:
Return ONLY valid JSON with this structure:

{
  "personal": {
    "name": "string",
    "title": "string",
    "location": "string",
    "email": "string",
    "phone": "string"
  },
  "summary": ["paragraph 1", "paragraph 2"],
  "skills": ["skill1", "skill2", "skill3"],
  "experience": [
    {
      "company": "string",
      "role": "string",
      "location": "string",
      "start": "YYYY-MM",
      "end": "YYYY-MM or 'Present'",
      "bullets": ["bullet 1", "bullet 2"]
    }
  ],
  "education": [
    {
      "institution": "string",
      "degree": "string",
      "start": "YYYY",
      "end": "YYYY"
    }
  ]
}"#;
