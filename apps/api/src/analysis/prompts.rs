/// Temperature for analysis calls; kept low for consistent scoring.
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;
pub const ANALYSIS_MAX_TOKENS: u32 = 1500;

/// Analysis prompt template. Replace `{email_content}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an expert cold email analyst. Analyze the following cold email and provide a detailed scoring and feedback.

Email to analyze:
"""
{email_content}
"""

Please provide your analysis in the exact JSON format below (no additional text or markdown formatting):

{
  "overall_score": <number 0-100>,
  "tone_score": <number 0-100>,
  "structure_score": <number 0-100>,
  "clarity_score": <number 0-100>,
  "spam_score": <number 0-100 where higher means more spammy>,
  "suggestions": [
    "<specific actionable improvement suggestion>",
    "<another suggestion>"
  ],
  "strengths": [
    "<what the email does well>",
    "<another strength>"
  ],
  "red_flags": [
    "<potential issues or spam triggers>",
    "<another red flag>"
  ]
}

Scoring criteria:
- Tone (0-100): Professional yet personable, appropriate for cold outreach
- Structure (0-100): Clear opening, value proposition, call to action
- Clarity (0-100): Easy to understand, concise, well-written
- Spam Score (0-100): Higher score = more likely to be flagged as spam

Focus on practical, actionable feedback that will improve response rates."#;
