//! Inline video player URLs for links carrying a [`VideoEmbed`].

use navsphere_shared::{VideoEmbed, VideoPlatform};
use url::form_urlencoded;

use crate::pipeline::DEFAULT_VIDEO_PAGE;

/// Player page for bilibili embeds (protocol-relative, as the host expects).
const BILIBILI_PLAYER: &str = "//player.bilibili.com/player.html";

/// Embed prefix for youtube videos.
const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed";

/// Build the iframe `src` for an embed.
///
/// Missing ids render as empty query values rather than failing; the
/// player shows its own error page for them. Ids are percent-encoded.
pub fn player_url(video: &VideoEmbed) -> String {
    match video.platform {
        VideoPlatform::Bilibili => {
            let p = video.p.unwrap_or(DEFAULT_VIDEO_PAGE).to_string();
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("isOutside", "true")
                .append_pair("aid", video.aid.as_deref().unwrap_or_default())
                .append_pair("bvid", video.bvid.as_deref().unwrap_or_default())
                .append_pair("cid", video.cid.as_deref().unwrap_or_default())
                .append_pair("p", &p)
                .append_pair("autoplay", "1")
                .finish();
            format!("{BILIBILI_PLAYER}?{query}")
        }
        VideoPlatform::Youtube => {
            let id = video.video_id.as_deref().unwrap_or_default();
            let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
            format!("{YOUTUBE_EMBED}/{id}?autoplay=1")
        }
    }
}

/// Label shown on the video card.
pub fn badge(platform: VideoPlatform) -> &'static str {
    match platform {
        VideoPlatform::Bilibili => "bilibili",
        VideoPlatform::Youtube => "YouTube",
    }
}
