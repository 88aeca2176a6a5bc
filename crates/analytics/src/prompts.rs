//! Prompt catalogue.
//!
//! Every reduce-level template carries a `{stats}` slot for the exact
//! statistics of the period it summarises.

use crate::template::PromptTemplate;

/// Per-employee analysis. Binds `id` and `data`.
pub const REP_ANALYSIS: PromptTemplate = PromptTemplate::new(
    "rep_analysis",
    r#"
You are an analyst. Provide a detailed performance analysis and feedback for
the sales representative with employee_id: {id}

Use the following data to give the analysis:
{data}
"#,
);

/// Team map stage, one call per chunk. Binds `data`.
pub const TEAM_CHUNK: PromptTemplate = PromptTemplate::new(
    "team_chunk",
    r#"
You are a data analyst. Review the following data and produce a brief, structured
summary containing only the essential metrics and key insights.
Use terse bullet points rather than full sentences: this summary is input for
another language model that writes the final report.

**Data to Analyze:**
{data}

**Generate output as follows:**
- overall performance analysis
- key strengths
- areas to improve
- top performers
- worst performers
Add more if you find it useful.
"#,
);

/// Team reduce stage. Binds `employee_summaries`, `chunk_count` and `stats`.
pub const TEAM_REDUCE: PromptTemplate = PromptTemplate::new(
    "team_reduce",
    r#"
You are a team analyst. Below are {chunk_count} summaries of different chunks of the entire dataset:
{employee_summaries}

Based on these summaries, provide an overall team performance analysis and highlight
key strengths and areas for improvement.
Use only the KPI values listed in {stats}. Do not infer additional values and do not
modify any KPI numbers; report them exactly as they appear.
Example format for KPIs:
- **Total Leads Taken:**
- **Total Tours Booked:**
- **Total Applications:**
- **Total Revenue Confirmed:**
- **Total Revenue Pending:**
- **Total Tours in Pipeline:**
- **Total Tours Cancelled:**
Don't include the total number of employees.
"#,
);

/// Monthly map stage, one call per calendar month. Binds `period`, `data` and `stats`.
pub const MONTHLY_TREND: PromptTemplate = PromptTemplate::new(
    "monthly_trend",
    r#"
Analyze the sales data for {period} to identify trends and forecast future performance.
Use only the numbers from the provided statistics to ensure accuracy and consistency.
Output should be brief and contain only essential metrics and insights.

### Data:
{data}

### Statistics:
{stats}

### Insight Requirements:
1. **Trends**: Highlight any significant increases, decreases, or stability in key metrics and total values.
2. **Comparative Analysis**: Summarize noticeable changes compared to previous periods.
3. **Patterns**: Identify any seasonal effects or recurring trends.
4. **Forecasting**: Provide a quick forecast based on observed trends, using only the statistics provided.
5. **Recommendations**: Briefly suggest actions to optimize future performance or address negative trends.

**Output Format**:
- Begin with the month and year in the first line.
- Use concise bullet points for each insight; this summary will later be expanded by another model.

**Example Output**:
- "Month-Year"
- Key Trends: [List of critical trends]
- Comparative Analysis: [List of key comparisons]
- Patterns: [List of patterns]
- Forecast: [Forecast summary]
- Recommendations: [Brief, actionable insights]

**Note**: All insights must be data-driven and reference only the numbers in the provided statistics.
"#,
);

/// Quarterly reduce stage over a bucket of monthly summaries. Binds
/// `monthly_data` and `stats`.
pub const QUARTERLY_REDUCE: PromptTemplate = PromptTemplate::new(
    "quarterly_reduce",
    r#"
Generate a quarterly trends, analysis and forecast summary from the monthly data provided.
Use only the values from the data and statistics provided. Focus on essential quarterly
insights, including brief forecasts, without lengthy explanations.

### Monthly Data:
{monthly_data}

### Quarter Statistics:
{stats}

### Insight Requirements:
1. **Quarterly Trends**: Identify significant growth, decline, or stability based on the monthly data.
2. **Key Metrics**: Report total and average values for the quarter exactly as given in the statistics.
3. **Comparative Analysis**: Note increases, decreases, or stable periods within the quarter.
4. **Patterns**: Identify recurring patterns or seasonal effects.
5. **Forecasting**: Provide a brief forecast for the next quarter based on observed trends.
6. **Recommendations**: Offer brief action items to sustain growth or address declines.

**Output Format**:
- Start with the quarter name and year (e.g., "Q1 2023").
- Provide insights in concise bullet points, including critical trends, metrics, and forecast.
- Keep language concise; this is input for another model generating a detailed report.
"#,
);
