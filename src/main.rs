use ultron_dashboard::entry;
use ultron_dashboard::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
