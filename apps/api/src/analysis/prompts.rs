pub const NAME_EXTRACTION_SYSTEM: &str =
    "You are an expert at extracting candidate names from resumes.";

pub const NAME_EXTRACTION_PROMPT: &str = r#"Extract the candidate's full name from the resume below.

Return JSON: {"name": "<full name>"}.
If no clear name is present, return {"name": null}.
Prefer the most complete professional form of the name.

Resume:
{resume_text}"#;

pub const TITLE_EXTRACTION_SYSTEM: &str =
    "You are an expert at extracting job titles from job descriptions.";

pub const TITLE_EXTRACTION_PROMPT: &str = r#"Extract the job title from the job description below.

Return JSON: {"title": "<job title>"}.
If no clear title is present, return {"title": null}.

Job Description:
{jd_text}"#;

pub const RECRUITER_SYSTEM: &str = "You are a professional HR recruiter analyzing resumes \
    against a specific job description.";

pub const CANDIDATE_FIT_PROMPT: &str = r#"Analyze how well this candidate fits the job.

Job Description:
{jd_text}

Resume:
{resume_text}

Cover:
1. Overall fit summary with a score out of 10
2. Requirements the candidate clearly meets, with evidence from the resume
3. Gaps or missing requirements
4. Relevant experience and its depth
5. Suggested interview questions

{format_instruction}"#;

pub const PROJECT_ANALYST_SYSTEM: &str = "You are an expert software project analyzer. \
    Provide a structured analysis of a repository README.";

pub const README_ANALYSIS_PROMPT: &str = r#"Analyze this GitHub repository in the context of the job description.

Repository URL: {repo_url}

Job Description:
{jd_text}

README Content:
{readme}

Cover:
1. Project overview
2. Key technologies and frameworks
3. Technical complexity
4. Relevance to the job description
5. Skills demonstrated
6. Interview discussion points

{format_instruction}"#;
