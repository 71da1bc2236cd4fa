use http_body_util::BodyExt;
use hyper::Response;
use vercel_runtime::{Error, Request, ResponseBody};

use zipnova_shipping::handler::serve;
use zipnova_shipping::{Route, telemetry};

async fn handler(request: Request) -> Result<Response<ResponseBody>, Error> {
    let method = request.method().clone();
    let body = request.into_body().collect().await?.to_bytes();

    let response = serve(Some(Route::CreateShipment), &method, &body).await?;
    Ok(response.map(ResponseBody::from))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    vercel_runtime::run(vercel_runtime::service_fn::<_, (Request,)>(handler)).await
}
