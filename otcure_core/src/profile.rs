//! Profile intake validation.

use crate::types::{Gender, PregnancyStatus, UserProfile};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Raw profile input as collected by a form
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub pregnancy: PregnancyStatus,
}

impl UserProfile {
    /// Build a profile from form input, reporting the first invalid field
    pub fn from_form(form: ProfileForm) -> Result<Self> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(Error::validation("name", "이름을 입력해주세요."));
        }

        let gender = form
            .gender
            .ok_or_else(|| Error::validation("gender", "성별을 선택해주세요."))?;

        let age = match form.age {
            Some(age) if age > 0 => age,
            _ => return Err(Error::validation("age", "나이는 1 이상이어야 합니다.")),
        };

        Ok(UserProfile {
            name: name.to_string(),
            age,
            gender,
            pregnancy: form.pregnancy,
        })
    }
}

impl std::str::FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "f" | "female" | "여" | "여성" => Ok(Gender::Female),
            "m" | "male" | "남" | "남성" => Ok(Gender::Male),
            "o" | "other" | "기타" => Ok(Gender::Other),
            _ => Err(Error::validation("gender", "성별을 선택해주세요.")),
        }
    }
}

impl std::str::FromStr for PregnancyStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "해당없음" => Ok(PregnancyStatus::None),
            "pregnant" | "임신" => Ok(PregnancyStatus::Pregnant),
            "breastfeeding" | "수유" => Ok(PregnancyStatus::Breastfeeding),
            other => Err(Error::validation(
                "pregnancy",
                format!("알 수 없는 값입니다: {}", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProfileForm {
        ProfileForm {
            name: "홍길동".into(),
            age: Some(34),
            gender: Some(Gender::Male),
            pregnancy: PregnancyStatus::None,
        }
    }

    fn field_of(err: Error) -> String {
        match err {
            Error::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_form() {
        let profile = UserProfile::from_form(form()).unwrap();
        assert_eq!(profile.name, "홍길동");
        assert!(!profile.is_elderly());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut f = form();
        f.name = "   ".into();
        assert_eq!(field_of(UserProfile::from_form(f).unwrap_err()), "name");
    }

    #[test]
    fn test_missing_gender_rejected() {
        let mut f = form();
        f.gender = None;
        assert_eq!(field_of(UserProfile::from_form(f).unwrap_err()), "gender");
    }

    #[test]
    fn test_zero_age_rejected() {
        let mut f = form();
        f.age = Some(0);
        assert_eq!(field_of(UserProfile::from_form(f).unwrap_err()), "age");
    }

    #[test]
    fn test_elderly_threshold() {
        let mut f = form();
        f.age = Some(60);
        assert!(UserProfile::from_form(f).unwrap().is_elderly());
    }

    #[test]
    fn test_parse_choices() {
        assert_eq!("여".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(
            "Breastfeeding".parse::<PregnancyStatus>().unwrap(),
            PregnancyStatus::Breastfeeding
        );
        assert!("maybe".parse::<PregnancyStatus>().is_err());
    }
}
