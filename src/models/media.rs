// Place media - photos and tips
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Photo {
    pub id: String,
    pub place_id: String,
    pub created_at: String,
    pub width: f64,
    pub height: f64,
    pub classifications: Vec<String>,
    pub prefix: String,
    pub suffix: String,
}

impl Photo {
    /// Full-size image URL: prefix + "<w>x<h>" + suffix with floored dimensions
    pub fn url(&self) -> String {
        self.sized_url(self.width, self.height)
    }

    pub fn sized_url(&self, width: f64, height: f64) -> String {
        format!(
            "{}{}x{}{}",
            self.prefix,
            width.floor() as i64,
            height.floor() as i64,
            self.suffix
        )
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0.0 {
            return 1.0;
        }
        self.width / self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Tip {
    pub id: String,
    pub place_id: String,
    pub created_at: String,
    pub text: String,
}
