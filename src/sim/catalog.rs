//! Snippet categories and the per-session spawn pool

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Name of the user-supplied category
pub const CUSTOM_CATEGORY: &str = "Custom";
/// Per-hit value of custom snippets
pub const CUSTOM_SCORE: f64 = 1.5;

/// A weighted snippet category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Score credited per hit
    pub score: f64,
    /// Fall speed factor
    pub speed_bonus: f32,
    /// Presentation hint (style class)
    pub style: String,
    pub snippets: Vec<String>,
}

impl Category {
    fn new(name: &str, score: f64, speed_bonus: f32, style: &str, snippets: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            score,
            speed_bonus,
            style: style.to_string(),
            snippets: snippets.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Category built from the user's custom snippet list
    pub fn custom(snippets: &[String]) -> Self {
        Self {
            name: CUSTOM_CATEGORY.to_string(),
            score: CUSTOM_SCORE,
            speed_bonus: 1.0,
            style: "c-custom".to_string(),
            snippets: snippets.to_vec(),
        }
    }
}

/// Built-in categories; later languages are worth more and fall slightly faster
pub fn builtin_categories() -> Vec<Category> {
    vec![
        Category::new(
            "JS",
            1.0,
            1.000,
            "c-ts",
            &["console.log(v);", "const x = 0;", "await fetch();", "res.json()"],
        ),
        Category::new(
            "C++",
            1.5,
            1.025,
            "c-cpp",
            &["int main()", "std::cout<<x;", "ptr = &y;", "#include<os>"],
        ),
        Category::new(
            "Java",
            2.0,
            1.050,
            "c-java",
            &["public class A", "System.out.println", "List<?> list", "throws Error"],
        ),
        Category::new(
            "Go",
            2.5,
            1.075,
            "c-go",
            &["func main()", "fmt.Println", "go func()", "if err != nil"],
        ),
        Category::new(
            "Py",
            3.0,
            1.100,
            "c-py",
            &["def init():", "import sys", "print(f\"{x}\")", "if __name__"],
        ),
    ]
}

/// Narrows the pool for a session (practice mode)
pub trait CategoryFilter: std::fmt::Debug {
    fn filter_categories(&self, pool: Vec<Category>) -> Vec<Category>;
}

/// Practice on a single language, or on all built-ins
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PracticeFilter {
    /// `None` or "all" keeps every built-in category
    pub language: Option<String>,
}

impl PracticeFilter {
    pub fn new(language: Option<String>) -> Self {
        Self { language }
    }
}

impl CategoryFilter for PracticeFilter {
    fn filter_categories(&self, pool: Vec<Category>) -> Vec<Category> {
        match self.language.as_deref() {
            None => pool,
            Some(lang) if lang.eq_ignore_ascii_case("all") => pool,
            Some(lang) => pool
                .into_iter()
                .filter(|c| c.name.eq_ignore_ascii_case(lang))
                .collect(),
        }
    }
}

/// Categories available to the spawner for one session
#[derive(Debug, Clone)]
pub struct CategoryPool {
    categories: Vec<Category>,
}

impl CategoryPool {
    /// Built-ins run through `filter`, plus the custom category when not practising.
    /// Falls back to the unfiltered built-ins if nothing is left.
    pub fn build(custom: &[String], filter: Option<&dyn CategoryFilter>) -> Self {
        let mut categories = match filter {
            Some(filter) => filter.filter_categories(builtin_categories()),
            None => builtin_categories(),
        };

        if filter.is_none() && !custom.is_empty() {
            categories.push(Category::custom(custom));
        }

        categories.retain(|c| !c.snippets.is_empty());
        if categories.is_empty() {
            log::warn!("Category filter left an empty pool, using defaults");
            categories = builtin_categories();
        }

        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Uniform category, then uniform snippet within it
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<(&Category, &str)> {
        if self.categories.is_empty() {
            return None;
        }
        let category = &self.categories[rng.random_range(0..self.categories.len())];
        if category.snippets.is_empty() {
            return None;
        }
        let text = &category.snippets[rng.random_range(0..category.snippets.len())];
        Some((category, text.as_str()))
    }
}
