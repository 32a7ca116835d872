// LLM prompt constants for interview preparation and message templates.

/// System prompt for structured coaching output: enforces JSON-only output.
pub const COACHING_JSON_SYSTEM: &str = "You are an experienced career coach for students and \
    young professionals. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences.";

/// System prompt for free-text answer feedback.
pub const FEEDBACK_SYSTEM: &str = "You are an experienced interview coach. \
    Be encouraging and constructive, especially for students or junior professionals.";

/// Replace `{count}`, `{experience}`, `{role}` and `{industry}` before sending.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Generate {count} interview questions for a {experience} level {role} position in the {industry} industry.

Return a JSON array with this structure:
[
  {
    "id": "question-1",
    "question": "interview question",
    "category": "behavioral|technical|situational|company",
    "difficulty": "easy|medium|hard",
    "tips": ["tip1", "tip2", "tip3"],
    "sampleAnswer": "example answer (optional)"
  }
]

Make sure questions are appropriate for the experience level and include a mix of behavioral and technical questions."#;

/// Replace `{question}`, `{category}` and `{answer}` before sending.
pub const FEEDBACK_PROMPT_TEMPLATE: &str = "Provide constructive feedback on this interview answer:

Question: {question}
Category: {category}
Answer: {answer}

Please provide:
1. What was good about the answer
2. Areas for improvement
3. Specific suggestions for a stronger response
4. A rating out of 10";

/// Replace `{kind}`, `{context}` and `{customization}` before sending.
pub const TEMPLATE_PROMPT_TEMPLATE: &str = r#"Generate a professional {kind} message template for a student or young professional.

Context: {context}
{customization}
Return JSON with this structure:
{
  "subject": "email subject line",
  "body": "email body with [VARIABLE_NAME] placeholders for customization",
  "variables": ["VARIABLE_NAME", "ANOTHER_VARIABLE"]
}

Make the tone professional but warm, appropriate for students reaching out in professional contexts."#;
