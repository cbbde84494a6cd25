use serde::{Deserialize, Serialize};

use crate::{
    errors::{AnalyticsError, AnalyticsResult},
    transform::to_percent,
};

/// Customer record scored by `POST /api/predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Age in years.
    #[serde(rename = "Age")]
    pub age: f64,
    /// Age bucket label, e.g. `25-34`.
    #[serde(rename = "Age_Group")]
    pub age_group: String,
    /// Gender label.
    #[serde(rename = "Gender")]
    pub gender: String,
    /// Country label.
    #[serde(rename = "Country")]
    pub country: String,
    /// Years of membership.
    #[serde(rename = "Membership_Years")]
    pub membership_years: f64,
    /// Logins per month.
    #[serde(rename = "Login_Frequency")]
    pub login_frequency: u32,
    /// Mean session length in minutes.
    #[serde(rename = "Session_Duration_Avg")]
    pub session_duration_avg: f64,
    /// Mean pages per session.
    #[serde(rename = "Pages_Per_Session")]
    pub pages_per_session: f64,
    /// Cart abandonment rate in percent.
    #[serde(rename = "Cart_Abandonment_Rate")]
    pub cart_abandonment_rate: f64,
    /// Items on the wishlist.
    #[serde(rename = "Wishlist_Items")]
    pub wishlist_items: u32,
    /// Number of purchases.
    #[serde(rename = "Total_Purchases")]
    pub total_purchases: f64,
    /// Mean order value.
    #[serde(rename = "Average_Order_Value")]
    pub average_order_value: f64,
    /// Days since the last purchase.
    #[serde(rename = "Days_Since_Last_Purchase")]
    pub days_since_last_purchase: u32,
    /// Discount usage in percent.
    #[serde(rename = "Discount_Usage_Rate")]
    pub discount_usage_rate: f64,
    /// Returns in percent.
    #[serde(rename = "Returns_Rate")]
    pub returns_rate: f64,
    /// Email open rate in percent.
    #[serde(rename = "Email_Open_Rate")]
    pub email_open_rate: f64,
    /// Support calls.
    #[serde(rename = "Customer_Service_Calls")]
    pub customer_service_calls: u32,
    /// Reviews written.
    #[serde(rename = "Product_Reviews_Written")]
    pub product_reviews_written: u32,
    /// Social engagement score.
    #[serde(rename = "Social_Media_Engagement_Score")]
    pub social_media_engagement_score: f64,
    /// Distinct payment methods used.
    #[serde(rename = "Payment_Method_Diversity")]
    pub payment_method_diversity: u32,
    /// Lifetime value.
    #[serde(rename = "Lifetime_Value")]
    pub lifetime_value: f64,
    /// Store credit balance.
    #[serde(rename = "Credit_Balance")]
    pub credit_balance: u32,
    /// Signup quarter, `Q1` to `Q4`.
    #[serde(rename = "Signup_Quarter")]
    pub signup_quarter: String,
}

impl Default for PredictRequest {
    fn default() -> Self {
        Self {
            age: 33.0,
            age_group: "25-34".into(),
            gender: "Female".into(),
            country: "Germany".into(),
            membership_years: 2.5,
            login_frequency: 10,
            session_duration_avg: 15.5,
            pages_per_session: 5.0,
            cart_abandonment_rate: 45.0,
            wishlist_items: 3,
            total_purchases: 12.0,
            average_order_value: 105.5,
            days_since_last_purchase: 14,
            discount_usage_rate: 25.0,
            returns_rate: 5.0,
            email_open_rate: 20.0,
            customer_service_calls: 2,
            product_reviews_written: 1,
            social_media_engagement_score: 30.0,
            payment_method_diversity: 2,
            lifetime_value: 1200.0,
            credit_balance: 500,
            signup_quarter: "Q2".into(),
        }
    }
}

impl PredictRequest {
    /// Checks the record before it is sent.
    pub fn validate(&self) -> AnalyticsResult<()> {
        let numeric = [
            ("Age", self.age),
            ("Membership_Years", self.membership_years),
            ("Session_Duration_Avg", self.session_duration_avg),
            ("Pages_Per_Session", self.pages_per_session),
            ("Cart_Abandonment_Rate", self.cart_abandonment_rate),
            ("Total_Purchases", self.total_purchases),
            ("Average_Order_Value", self.average_order_value),
            ("Discount_Usage_Rate", self.discount_usage_rate),
            ("Returns_Rate", self.returns_rate),
            ("Email_Open_Rate", self.email_open_rate),
            ("Social_Media_Engagement_Score", self.social_media_engagement_score),
            ("Lifetime_Value", self.lifetime_value),
        ];
        if let Some((field, value)) = numeric
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(AnalyticsError::InvalidRequest(format!(
                "{field} must be a non-negative number, got {value}"
            )));
        }
        let labels = [
            ("Age_Group", &self.age_group),
            ("Gender", &self.gender),
            ("Country", &self.country),
        ];
        if let Some((field, _)) = labels.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AnalyticsError::InvalidRequest(format!("{field} is empty")));
        }
        if !matches!(self.signup_quarter.as_str(), "Q1" | "Q2" | "Q3" | "Q4") {
            return Err(AnalyticsError::InvalidRequest(format!(
                "Signup_Quarter '{}' is not Q1-Q4",
                self.signup_quarter
            )));
        }
        Ok(())
    }
}

/// Successful response of `POST /api/predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// `1` for churn, `0` for retain.
    pub prediction: u8,
    /// Churn probability in `[0, 1]`.
    pub probability: f64,
}

/// Outcome class of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskVerdict {
    /// Model predicts churn.
    HighChurnRisk,
    /// Model predicts retention.
    LikelyToRetain,
}

impl RiskVerdict {
    /// Card headline.
    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::HighChurnRisk => "High Churn Risk",
            Self::LikelyToRetain => "Likely to Retain",
        }
    }

    /// Recommended follow-up.
    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::HighChurnRisk => {
                "Trigger retention campaign sequence (#C-302). Offer 15% discount."
            }
            Self::LikelyToRetain => {
                "No immediate action required. Maintain standard communications."
            }
        }
    }
}

/// Render-ready prediction card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionView {
    /// Outcome class.
    pub verdict: RiskVerdict,
    /// Headline text of the verdict.
    pub headline: String,
    /// Churn probability in percent at one decimal.
    pub probability_pct: String,
    /// Raw probability, for progress bars.
    pub probability: f64,
    /// Whether the probability exceeds one half.
    pub elevated: bool,
    /// Recommended follow-up.
    pub action: String,
}

impl PredictionView {
    /// Builds the card, rejecting labels other than 0/1 and probabilities
    /// outside `[0, 1]`.
    pub fn from_response(response: &PredictResponse) -> AnalyticsResult<Self> {
        let verdict = match response.prediction {
            1 => RiskVerdict::HighChurnRisk,
            0 => RiskVerdict::LikelyToRetain,
            other => {
                return Err(AnalyticsError::InvalidNumber(format!(
                    "prediction label {other} is not 0 or 1"
                )))
            }
        };
        if !(0.0..=1.0).contains(&response.probability) {
            return Err(AnalyticsError::InvalidNumber(format!(
                "probability {} outside [0, 1]",
                response.probability
            )));
        }
        Ok(Self {
            verdict,
            headline: verdict.headline().to_string(),
            probability_pct: to_percent(response.probability, 1)?,
            probability: response.probability,
            elevated: response.probability > 0.5,
            action: verdict.action().to_string(),
        })
    }
}
