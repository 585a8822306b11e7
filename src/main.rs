use searchbench::error::AppResult;

fn main() -> AppResult<()> {
    searchbench::entry::run()
}
