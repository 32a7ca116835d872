// LLM prompt constants for resume analysis.

/// System prompt for resume analysis: enforces JSON-only output.
pub const ANALYSIS_SYSTEM: &str = "You are an expert recruiter and career coach. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Resume analysis prompt. Replace `{resume_text}` and `{file_name}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Act as an expert recruiter and career coach. Analyze this resume using multiple specialized approaches:

1. SPOT THE FLAWS: Act as a critical recruiter reviewing this resume. Highlight weak areas, overused buzzwords, missing metrics, and be brutally honest about what needs improvement.

2. REWRITE FOR IMPACT: Identify how to make this resume more results-driven, quantifiable, and compelling. Focus on achievements over duties.

3. ATS OPTIMIZATION: Analyze ATS compatibility and suggest industry-specific keywords that should be naturally integrated.

4. CRAFT THE HOOK: Evaluate the professional summary/objective and suggest improvements for maximum recruiter impact.

5. EXPERIENCE ENHANCEMENT: Analyze how to rephrase experience sections with action verbs, quantifiable outcomes, and transferable skills.

Resume Text:
{resume_text}

Return a JSON object with this EXACT structure:
{
  "fileName": "{file_name}",
  "analysisId": "generated-id",
  "overallScore": 0,
  "sections": {
    "atsCompatibility": {
      "score": 0,
      "issues": ["issue"],
      "improvements": ["improvement"],
      "keywords": { "missing": ["keyword"], "present": ["keyword"], "suggested": ["keyword"] }
    },
    "skillsGaps": {
      "score": 0,
      "technical": { "present": ["skill"], "missing": ["skill"], "trending": ["skill"] },
      "soft": { "present": ["skill"], "missing": ["skill"], "important": ["skill"] },
      "recommendations": ["recommendation"]
    },
    "experience": {
      "score": 0,
      "level": "entry|junior|mid|senior",
      "strengths": ["strength"],
      "gaps": ["gap"],
      "suggestions": ["suggestion"],
      "projectIdeas": ["project"]
    },
    "grammar": {
      "score": 0,
      "errors": [{ "type": "spelling|grammar|punctuation", "text": "error text", "suggestion": "correction" }],
      "improvements": ["improvement"]
    },
    "formatting": {
      "score": 0,
      "issues": ["issue"],
      "positives": ["positive"],
      "suggestions": ["suggestion"]
    },
    "flawAnalysis": {
      "score": 0,
      "buzzwords": { "overused": ["buzzword"], "suggestions": ["better wording"] },
      "weakAreas": [{ "area": "section name", "issue": "specific problem", "improvement": "how to fix it" }],
      "missingMetrics": ["Add quantified achievements"],
      "structuralIssues": ["issue"],
      "honestFeedback": ["brutal but constructive feedback"]
    },
    "impactRewrite": {
      "score": 0,
      "currentIssues": ["duty-focused language"],
      "rewriteSuggestions": [{ "original": "original text", "improved": "improved version", "reasoning": "why this is better" }],
      "actionVerbSuggestions": ["verb"],
      "quantificationTips": ["tip"],
      "achievementHighlights": ["highlight"]
    },
    "professionalSummary": {
      "score": 0,
      "currentSummary": "current summary text or 'Not found'",
      "hookStrength": 0,
      "suggestedSummary": "powerful 3-line summary",
      "impactKeywords": ["keyword"],
      "improvements": ["improvement"],
      "personalBranding": ["brand"]
    }
  },
  "recommendations": [
    {
      "id": "rec-1",
      "category": "ats|skills|experience|grammar|formatting|flaws|impact|summary",
      "priority": "high|medium|low",
      "title": "recommendation title",
      "description": "detailed description",
      "actionable": "specific action to take",
      "timeEstimate": "estimated time"
    }
  ],
  "nextSteps": ["step"],
  "careerRoadmap": {
    "currentLevel": "entry|junior|mid|senior",
    "targetRoles": ["role"],
    "skillProgression": [{ "role": "target role", "requiredSkills": ["skill"], "timeToAchieve": "6-12 months", "learningPath": ["step"] }],
    "industryTrends": ["trend"],
    "certificationRecommendations": ["certification"]
  },
  "skillsGapTable": [
    {
      "role": "Software Engineer",
      "industry": "Technology",
      "requiredSkills": [
        {
          "skill": "JavaScript",
          "importance": "Critical|Important|Nice to Have",
          "currentLevel": "None|Beginner|Intermediate|Advanced",
          "gap": "High|Medium|Low",
          "learningResources": ["resource"],
          "timeToLearn": "2-3 months"
        }
      ],
      "overallMatch": 0
    }
  ]
}

All scores are integers from 0 to 100.
Focus on being encouraging and constructive, especially for students who may lack extensive experience. Provide specific, actionable advice."#;

/// Fills the analysis template.
pub fn analysis_prompt(resume_text: &str, file_name: &str) -> String {
    // file name first: resume text may itself contain "{file_name}"
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{file_name}", &file_name.replace('"', "'"))
        .replace("{resume_text}", resume_text)
}
