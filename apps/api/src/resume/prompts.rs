/// Resume text beyond this many chars is not sent to the model.
pub const MAX_PROMPT_CHARS: usize = 12_000;

pub const EXTRACT_SKILLS_PROMPT: &str = r#"Extract the professional skills from the resume below.

For each skill return:
- "name": the skill as written in the resume, short (e.g. "Python", "SQL", "حسابداری")
- "level": proficiency from 1 (beginner) to 5 (expert), judged from years of use and responsibility
- "samples": number of concrete projects or portfolio items that show the skill (0 if none)

{no_invention}

Return JSON of the form:
{"skills": [{"name": "...", "level": 3, "samples": 0}]}

Resume:
"""
{resume_text}
""""#;
