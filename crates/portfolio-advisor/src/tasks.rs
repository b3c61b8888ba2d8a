//! Task Descriptions
//!
//! Tasks say WHAT an agent should produce; the agent decides which tools to use.

pub fn stock_analysis_task(ticker: &str, language: &str) -> String {
    format!(
        "Perform a comprehensive fundamental analysis of {ticker}.\n\n\
         Steps:\n\
         1. Use get_stock_data to retrieve the financial metrics of {ticker}.\n\
         2. Use get_company_info to retrieve company details for {ticker}.\n\
         3. Combine all data into a professional investment report.\n\n\
         Your report MUST contain these sections:\n\
         ## Company Overview\n\
         What the company does, sector, industry, key facts.\n\n\
         ## Financial Metrics\n\
         Price, market cap, P/E, revenue, margins, EPS: all key figures.\n\n\
         ## Investment Thesis\n\
         Why this stock is or is not attractive, backed by concrete data.\n\n\
         ## Growth Catalysts\n\
         Main drivers that could fuel future growth.\n\n\
         ## Risk Assessment\n\
         Biggest risks, concerns, and what could go wrong.\n\n\
         ## Recommendation\n\
         A clear **BUY**, **HOLD**, or **SELL** recommendation with reasoning.\n\n\
         Respond in {language}.\n"
    )
}

pub fn news_analysis_task(ticker: &str, language: &str) -> String {
    format!(
        "Analyze recent news about {ticker}.\n\n\
         1. Use search_news to retrieve current articles about {ticker}.\n\
         2. For each article provide:\n   \
            - **Headline**: original title\n   \
            - **Summary**: 2-3 sentences\n   \
            - **Impact**: 🟢 POSITIVE, 🟡 NEUTRAL or 🔴 NEGATIVE\n   \
            - **Reasoning**: why you assess the impact this way\n\n\
         3. Close with an **Overall Sentiment** section summarizing the collective impact.\n\
         4. If no news is found, say so and provide general market context.\n\n\
         Respond in {language}.\n"
    )
}

pub fn portfolio_analysis_task(language: &str) -> String {
    format!(
        "Analyze the current investment portfolio.\n\n\
         1. Use get_portfolio_data to read all positions.\n\
         2. Use calculate_returns to get live performance data.\n\
         3. Produce a comprehensive portfolio health report.\n\n\
         Your report MUST contain:\n\
         ## Portfolio Summary\n\
         Total value, invested capital, total return in percent.\n\n\
         ## Positions\n\
         Performance of every position with concrete figures.\n\n\
         ## Top Performer\n\
         Best stock and why it is doing well.\n\n\
         ## Worst Performer\n\
         Weakest stock, with an assessment of whether to hold or sell.\n\n\
         ## Risk Assessment\n\
         Concentration risk, sector exposure, diversification.\n\n\
         ## Recommendations\n\
         Concrete, actionable steps to improve portfolio performance.\n\n\
         Respond in {language}.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_name_ticker_and_tools() {
        let stock = stock_analysis_task("RKLB", "German");
        assert!(stock.contains("fundamental analysis of RKLB"));
        assert!(stock.contains("get_company_info"));
        assert!(stock.ends_with("Respond in German.\n"));

        assert!(news_analysis_task("NVDA", "English").contains("search_news to retrieve current articles about NVDA"));
        assert!(portfolio_analysis_task("German").contains("calculate_returns"));
    }
}
