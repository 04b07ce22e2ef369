mod http;
mod player;
mod time;

pub use self::http::{
    Http, HttpError, HttpHeaders, HttpMethod, HttpOperation, HttpRequest, HttpResponse,
    HttpResult, MultipartForm, ValidatedUrl,
};
pub use self::player::{Player, PlayerOperation};
pub use self::time::{Time, TimeOperation, TimerElapsed};

// Crux's built-in Render capability covers view invalidation as is.
pub use crux_core::render::Render;

use crux_core::capability::ProtoContext;
use crux_core::render::RenderOperation;
use crux_core::{Request, WithContext};

use crate::{App, Event};

pub type AppHttp = Http<Event>;
pub type AppTime = Time<Event>;
pub type AppPlayer = Player<Event>;
pub type AppRender = Render<Event>;

pub struct Capabilities {
    pub http: AppHttp,
    pub time: AppTime,
    pub player: AppPlayer,
    pub render: AppRender,
}

pub enum Effect {
    Http(Request<HttpOperation>),
    Time(Request<TimeOperation>),
    Player(Request<PlayerOperation>),
    Render(Request<RenderOperation>),
}

impl WithContext<App, Effect> for Capabilities {
    fn new_with_context(context: ProtoContext<Effect, Event>) -> Capabilities {
        Capabilities {
            http: Http::new(context.specialize(Effect::Http)),
            time: Time::new(context.specialize(Effect::Time)),
            player: Player::new(context.specialize(Effect::Player)),
            render: Render::new(context.specialize(Effect::Render)),
        }
    }
}

impl Capabilities {
    pub fn http(&self) -> &AppHttp {
        &self.http
    }

    pub fn time(&self) -> &AppTime {
        &self.time
    }

    pub fn player(&self) -> &AppPlayer {
        &self.player
    }

    pub fn render(&self) -> &AppRender {
        &self.render
    }
}
