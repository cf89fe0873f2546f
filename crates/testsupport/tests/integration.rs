use client::Client;
use testsupport::server::TestServer;

#[tokio::test]
async fn wire_round_trip_through_test_server() {
    let server = TestServer::start().await.unwrap();

    let client = Client::connect(server.addr()).await.unwrap();
    let out = client.execute("CREATE t { a INT }").await.unwrap();
    assert_eq!(out, "OK");

    let client = Client::connect(server.addr()).await.unwrap();
    let out = client.execute("INSERT INTO t VALUES (5)").await.unwrap();
    assert_eq!(out, "OK");

    let client = Client::connect(server.addr()).await.unwrap();
    let out = client.execute("SELECT * FROM t").await.unwrap();
    assert_eq!(out, "{ [5,] }");
}
