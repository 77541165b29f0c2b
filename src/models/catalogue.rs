//! 课程与成绩类型选项
//!
//! 供前端展示下拉框使用，数据来自初始页面

use scraper::{Html, Selector};

/// 下拉框选项：显示名称 → 提交值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOption {
    pub name: String,
    pub value: String,
}

impl SelectorOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 成绩类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultType {
    /// 正常考试
    Main,
    /// 特殊补考
    SpecialBack,
}

impl ResultType {
    pub const ALL: [ResultType; 2] = [ResultType::Main, ResultType::SpecialBack];

    /// 提交给 ddlResultType 的值
    pub fn value(self) -> &'static str {
        match self {
            ResultType::Main => "",
            ResultType::SpecialBack => "6",
        }
    }

    /// 显示名称
    pub fn name(self) -> &'static str {
        match self {
            ResultType::Main => "Main",
            ResultType::SpecialBack => "Special Back",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.value() == value)
    }
}

/// 初始页面上的全部可选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    pub courses: Vec<SelectorOption>,
    pub result_types: Vec<SelectorOption>,
}

impl Catalogue {
    pub fn from_markup(markup: &str) -> Self {
        Self {
            courses: list_courses(markup),
            result_types: list_result_types(markup),
        }
    }

    /// 按提交值查找课程
    pub fn course(&self, value: &str) -> Option<&SelectorOption> {
        self.courses.iter().find(|c| c.value == value)
    }
}

/// 课程列表（跳过第一个 "-Select-" 占位选项）
pub fn list_courses(markup: &str) -> Vec<SelectorOption> {
    select_options(markup, "#ddlCourse option")
}

/// 成绩类型列表；页面上没有时使用内置的两种类型
pub fn list_result_types(markup: &str) -> Vec<SelectorOption> {
    let options = select_options(markup, "#ddlResultType option");
    if !options.is_empty() {
        return options;
    }
    ResultType::ALL
        .into_iter()
        .map(|t| SelectorOption::new(t.name(), t.value()))
        .collect()
}

fn select_options(markup: &str, selector: &str) -> Vec<SelectorOption> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    let document = Html::parse_document(markup);
    document
        .select(&selector)
        .skip(1)
        .map(|option| {
            let name = option.text().collect::<String>().trim().to_string();
            let value = option.value().attr("value").unwrap_or_default().to_string();
            SelectorOption { name, value }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <select name="ddlCourse" id="ddlCourse">
            <option value="0">-Select-</option>
            <option value="5"> B.C.A. </option>
            <option value="12">M.Sc. Physics</option>
        </select>"#;

    #[test]
    fn test_list_courses_skips_placeholder() {
        let courses = list_courses(PAGE);
        assert_eq!(
            courses,
            vec![
                SelectorOption::new("B.C.A.", "5"),
                SelectorOption::new("M.Sc. Physics", "12"),
            ]
        );
    }

    #[test]
    fn test_result_types_fall_back_to_builtin() {
        let types = list_result_types(PAGE);
        assert_eq!(
            types,
            vec![
                SelectorOption::new("Main", ""),
                SelectorOption::new("Special Back", "6"),
            ]
        );
    }

    #[test]
    fn test_result_types_from_page() {
        let page = r#"
            <select id="ddlResultType">
                <option value="-1">-Select-</option>
                <option value="">Main</option>
                <option value="6">Special Back</option>
                <option value="7">Improvement</option>
            </select>"#;
        let types = list_result_types(page);
        assert_eq!(types.len(), 3);
        assert_eq!(types[2], SelectorOption::new("Improvement", "7"));
    }

    #[test]
    fn test_catalogue_lookup_by_value() {
        let catalogue = Catalogue::from_markup(PAGE);
        assert_eq!(catalogue.course("12").map(|c| c.name.as_str()), Some("M.Sc. Physics"));
        assert!(catalogue.course("0").is_none());
        assert_eq!(catalogue.result_types.len(), 2);
    }

    #[test]
    fn test_result_type_from_value() {
        assert_eq!(ResultType::from_value("6"), Some(ResultType::SpecialBack));
        assert_eq!(ResultType::from_value(""), Some(ResultType::Main));
        assert_eq!(ResultType::from_value("9"), None);
    }
}
