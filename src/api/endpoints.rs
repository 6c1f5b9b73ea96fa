// Data Dragon URL builders

pub const DATA_DRAGON_BASE_URL: &str = "https://ddragon.leagueoflegends.com";
pub const DEFAULT_LOCALE: &str = "en_US";

pub fn versions_url(base_url: &str) -> String {
    format!("{}/api/versions.json", base_url.trim_end_matches('/'))
}

pub fn champion_data_url(base_url: &str, version: &str, locale: &str) -> String {
    format!(
        "{}/cdn/{}/data/{}/champion.json",
        base_url.trim_end_matches('/'),
        version,
        locale
    )
}

pub fn champion_icon_url(base_url: &str, version: &str, image_file: &str) -> String {
    format!(
        "{}/cdn/{}/img/champion/{}",
        base_url.trim_end_matches('/'),
        version,
        image_file
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_cdn_urls() {
        assert_eq!(
            versions_url("https://ddragon.leagueoflegends.com/"),
            "https://ddragon.leagueoflegends.com/api/versions.json"
        );
        assert_eq!(
            champion_data_url(DATA_DRAGON_BASE_URL, "14.24.1", "ko_KR"),
            "https://ddragon.leagueoflegends.com/cdn/14.24.1/data/ko_KR/champion.json"
        );
        assert_eq!(
            champion_icon_url(DATA_DRAGON_BASE_URL, "14.24.1", "Ahri.png"),
            "https://ddragon.leagueoflegends.com/cdn/14.24.1/img/champion/Ahri.png"
        );
    }
}
